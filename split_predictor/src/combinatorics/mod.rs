//! Lazy enumeration of k-combinations and k-permutations of a slice.
//!
//! Both iterators yield fresh vectors, preserve the slice's relative order,
//! and use each position at most once. Results come in lexicographic order
//! of source positions, so enumeration order is deterministic.

/// Iterator over every `k`-element combination of `items`.
#[derive(Debug, Clone)]
pub struct Combinations<'a, T> {
    items: &'a [T],
    indices: Vec<usize>,
    done: bool,
}

impl<'a, T: Clone> Combinations<'a, T> {
    pub fn new(items: &'a [T], k: usize) -> Self {
        Self {
            items,
            indices: (0..k).collect(),
            done: k > items.len(),
        }
    }

    fn current(&self) -> Vec<T> {
        self.indices.iter().map(|&i| self.items[i].clone()).collect()
    }

    fn advance(&mut self) {
        let n = self.items.len();
        let k = self.indices.len();

        // Rightmost position that can still move forward.
        let Some(i) = (0..k).rev().find(|&i| self.indices[i] != i + n - k) else {
            self.done = true;
            return;
        };
        self.indices[i] += 1;
        for j in (i + 1)..k {
            self.indices[j] = self.indices[j - 1] + 1;
        }
    }
}

impl<T: Clone> Iterator for Combinations<'_, T> {
    type Item = Vec<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let combo = self.current();
        self.advance();
        Some(combo)
    }
}

/// Iterator over every ordered selection of `k` distinct positions of `items`.
#[derive(Debug, Clone)]
pub struct Permutations<'a, T> {
    items: &'a [T],
    k: usize,
    indices: Vec<usize>,
    cycles: Vec<usize>,
    started: bool,
    done: bool,
}

impl<'a, T: Clone> Permutations<'a, T> {
    pub fn new(items: &'a [T], k: usize) -> Self {
        let n = items.len();
        Self {
            items,
            k,
            indices: (0..n).collect(),
            cycles: if k <= n { (n - k + 1..=n).rev().collect() } else { Vec::new() },
            started: false,
            done: k > n,
        }
    }

    fn current(&self) -> Vec<T> {
        self.indices[..self.k]
            .iter()
            .map(|&i| self.items[i].clone())
            .collect()
    }
}

impl<T: Clone> Iterator for Permutations<'_, T> {
    type Item = Vec<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if !self.started {
            self.started = true;
            return Some(self.current());
        }

        let n = self.items.len();
        for i in (0..self.k).rev() {
            self.cycles[i] -= 1;
            if self.cycles[i] == 0 {
                // Rotate position i to the end and reset its cycle.
                let moved = self.indices.remove(i);
                self.indices.push(moved);
                self.cycles[i] = n - i;
            } else {
                let j = n - self.cycles[i];
                self.indices.swap(i, j);
                return Some(self.current());
            }
        }
        self.done = true;
        None
    }
}

/// All `k`-element combinations of `items`, lazily.
pub fn combinations<T: Clone>(items: &[T], k: usize) -> Combinations<'_, T> {
    Combinations::new(items, k)
}

/// All `k`-element permutations of `items`, lazily.
pub fn permutations<T: Clone>(items: &[T], k: usize) -> Permutations<'_, T> {
    Permutations::new(items, k)
}
