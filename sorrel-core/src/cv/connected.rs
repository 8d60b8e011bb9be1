// Copyright (c) 2025, Tom Ouellette
// Licensed under the MIT License

use std::cmp::Ordering;

use num::Zero;

/// A union-find structure for finding and merging connected components
pub struct UnionFind {
    parent: Vec<usize>,
    rank: Vec<usize>,
}

impl UnionFind {
    /// Initialize a new union-find object with `n` elements in `n` sets
    pub fn new(n: usize) -> Self {
        UnionFind {
            parent: (0..n).collect(),
            rank: vec![1; n],
        }
    }

    /// Find the root of the set containing `x`
    pub fn find(&mut self, x: usize) -> usize {
        let mut root = x;
        while self.parent[root] != root {
            root = self.parent[root];
        }

        // Path compression
        let mut node = x;
        while self.parent[node] != root {
            let next = self.parent[node];
            self.parent[node] = root;
            node = next;
        }

        root
    }

    /// Merge sets containing `x` and `y`
    pub fn union(&mut self, x: usize, y: usize) {
        let root_x = self.find(x);
        let root_y = self.find(y);

        if root_x != root_y {
            match self.rank[root_x].cmp(&self.rank[root_y]) {
                Ordering::Greater => self.parent[root_y] = root_x,
                Ordering::Less => self.parent[root_x] = root_y,
                Ordering::Equal => {
                    self.parent[root_y] = root_x;
                    self.rank[root_x] += 1;
                }
            }
        }
    }

    /// Check if `x` and `y` belong to the same set
    pub fn connected(&mut self, x: usize, y: usize) -> bool {
        self.find(x) == self.find(y)
    }
}

/// Two-pass 8-connected component labeling on mask buffers
///
/// Any non-zero pixel is foreground. Components are numbered 1, 2, ... in
/// the order their first pixel is met in a row-major scan.
///
/// # Arguments
///
/// * `width` - Width of mask
/// * `height` - Height of mask
/// * `buffer` - A row-major mask buffer
///
/// # Examples
///
/// ```
/// use sorrel_core::cv::connected_components;
///
/// let buffer_one: Vec<u8> = vec![1, 1, 0, 1, 0, 1, 0, 1, 1];
/// let labels_one = connected_components(3, 3, &buffer_one);
/// assert_eq!(labels_one, [1, 1, 0, 1, 0, 1, 0, 1, 1]);
///
/// let buffer_two: Vec<u32> = vec![10, 10, 10, 0, 0, 0, 20, 20, 20];
/// let labels_two = connected_components(3, 3, &buffer_two);
/// assert_eq!(labels_two, [1, 1, 1, 0, 0, 0, 2, 2, 2]);
/// ```
pub fn connected_components<T>(width: u32, height: u32, buffer: &[T]) -> Vec<u32>
where
    T: Zero + PartialEq,
{
    let width = width as usize;
    let height = height as usize;
    let size = width * height;

    let foreground = |idx: usize| !buffer[idx].is_zero();

    let mut labels = vec![0u32; size];
    let mut next_label = 1u32;
    let mut uf = UnionFind::new(size + 1);

    // Assign preliminary labels (1st pass)
    for y in 0..height {
        for x in 0..width {
            let idx = y * width + x;
            if !foreground(idx) {
                continue;
            }

            let mut neighbors = [0u32; 4];
            let mut n_neighbors = 0;

            let mut visit = |nidx: usize| {
                if foreground(nidx) {
                    neighbors[n_neighbors] = labels[nidx];
                    n_neighbors += 1;
                }
            };

            // Left, top, top-left and top-right neighbors
            if x > 0 {
                visit(idx - 1);
            }
            if y > 0 {
                visit(idx - width);
            }
            if x > 0 && y > 0 {
                visit(idx - width - 1);
            }
            if x + 1 < width && y > 0 {
                visit(idx - width + 1);
            }

            match neighbors[..n_neighbors].iter().min() {
                None => {
                    labels[idx] = next_label;
                    next_label += 1;
                }
                Some(&min_label) => {
                    labels[idx] = min_label;
                    for &label in &neighbors[..n_neighbors] {
                        uf.union(min_label as usize, label as usize);
                    }
                }
            }
        }
    }

    // Resolve equivalent labels and renumber roots by first appearance (2nd pass)
    let mut renumber = vec![0u32; next_label as usize];
    let mut n_components = 0u32;

    for label in labels.iter_mut() {
        if *label == 0 {
            continue;
        }

        let root = uf.find(*label as usize);
        if renumber[root] == 0 {
            n_components += 1;
            renumber[root] = n_components;
        }

        *label = renumber[root];
    }

    labels
}

/// Pixel counts of each 8-connected component in discovery (raster) order
///
/// # Examples
///
/// ```
/// use sorrel_core::cv::component_areas;
///
/// let buffer: Vec<u8> = vec![
///     0, 1, 0, 0,
///     0, 0, 0, 1,
///     0, 0, 1, 1,
/// ];
///
/// assert_eq!(component_areas(4, 3, &buffer), vec![1, 3]);
/// ```
pub fn component_areas<T>(width: u32, height: u32, buffer: &[T]) -> Vec<u32>
where
    T: Zero + PartialEq,
{
    let labels = connected_components(width, height, buffer);

    let mut areas: Vec<u32> = Vec::new();
    for &label in labels.iter().filter(|&&l| l != 0) {
        let idx = label as usize - 1;
        if idx == areas.len() {
            areas.push(0);
        }
        areas[idx] += 1;
    }

    areas
}

/// Pixel count of the first 8-connected component met in a raster scan
///
/// Returns 0 for a mask without foreground pixels.
pub fn first_component_area<T>(width: u32, height: u32, buffer: &[T]) -> u32
where
    T: Zero + PartialEq,
{
    component_areas(width, height, buffer)
        .first()
        .copied()
        .unwrap_or(0)
}
