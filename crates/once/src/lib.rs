//! Append-only containers whose entries are written exactly once and can be read through a shared
//! reference while other threads keep pushing.
//!
//! These are used to cache tables that are computed lazily degree by degree, e.g. the basis of an
//! algebra in each degree.

use std::{
    ops::Index,
    sync::{
        atomic::{AtomicUsize, Ordering},
        OnceLock,
    },
};

use parking_lot::{Mutex, MutexGuard};

const MAX_PAGES: usize = usize::BITS as usize;

/// Page `k` holds `2^k` entries, so entry `i` lives in page `floor(log_2(i + 1))`.
fn locate(index: usize) -> (usize, usize) {
    let n = index + 1;
    let page = (usize::BITS - 1 - n.leading_zeros()) as usize;
    (page, n - (1 << page))
}

/// A push-only vector. Entries are never moved once written, so references returned by
/// [`OnceVec::get`] stay valid for as long as the vector itself.
pub struct OnceVec<T> {
    len: AtomicUsize,
    lock: Mutex<()>,
    pages: [OnceLock<Box<[OnceLock<T>]>>; MAX_PAGES],
}

impl<T> Default for OnceVec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> OnceVec<T> {
    pub fn new() -> Self {
        Self {
            len: AtomicUsize::new(0),
            lock: Mutex::new(()),
            pages: std::array::from_fn(|_| OnceLock::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.len.load(Ordering::Acquire)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        if index >= self.len() {
            return None;
        }
        let (page, offset) = locate(index);
        self.pages[page].get()?.get(offset)?.get()
    }

    /// Takes the lock that serializes pushes. This is useful when the caller needs to make
    /// several pushes, possibly to different vectors, atomically.
    pub fn lock(&self) -> MutexGuard<'_, ()> {
        self.lock.lock()
    }

    /// Appends `value` and returns its index.
    pub fn push(&self, value: T) -> usize {
        let _guard = self.lock.lock();
        self.push_locked(value)
    }

    fn push_locked(&self, value: T) -> usize {
        let index = self.len.load(Ordering::Acquire);
        let (page, offset) = locate(index);
        let slots =
            self.pages[page].get_or_init(|| (0..1 << page).map(|_| OnceLock::new()).collect());
        assert!(
            slots[offset].set(value).is_ok(),
            "OnceVec slot {index} written twice"
        );
        self.len.store(index + 1, Ordering::Release);
        index
    }

    /// Pushes `f(i)` for every `i` from `self.len()` up to and including `max`. `f` may read the
    /// vector but must not push to it.
    pub fn extend(&self, max: usize, mut f: impl FnMut(usize) -> T) {
        if max < self.len() {
            return;
        }
        let _guard = self.lock.lock();
        for i in self.len()..=max {
            self.push_locked(f(i));
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        (0..self.len()).map_while(move |i| self.get(i))
    }

    pub fn last(&self) -> Option<&T> {
        self.len().checked_sub(1).and_then(|i| self.get(i))
    }
}

impl<T> Index<usize> for OnceVec<T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        self.get(index).unwrap_or_else(|| {
            panic!(
                "Index out of bounds: the len is {} but the index is {index}",
                self.len()
            )
        })
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for OnceVec<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

/// A [`OnceVec`] indexed by `i32`, starting at `min_degree`.
pub struct OnceBiVec<T> {
    data: OnceVec<T>,
    min_degree: i32,
}

impl<T> OnceBiVec<T> {
    pub fn new(min_degree: i32) -> Self {
        Self {
            data: OnceVec::new(),
            min_degree,
        }
    }

    pub fn min_degree(&self) -> i32 {
        self.min_degree
    }

    /// One more than the largest degree that has been set.
    pub fn len(&self) -> i32 {
        self.min_degree + self.data.len() as i32
    }

    pub fn max_degree(&self) -> i32 {
        self.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn get(&self, degree: i32) -> Option<&T> {
        if degree < self.min_degree {
            return None;
        }
        self.data.get((degree - self.min_degree) as usize)
    }

    /// Pushes `value` in degree `degree`, which must be the next degree to be filled.
    pub fn push_checked(&self, value: T, degree: i32) {
        let _guard = self.data.lock();
        assert_eq!(
            degree,
            self.len(),
            "OnceBiVec expected degree {} but got {degree}",
            self.len()
        );
        self.data.push_locked(value);
    }

    /// Computes the entries up to and including degree `max`.
    pub fn extend(&self, max: i32, mut f: impl FnMut(i32) -> T) {
        if max < self.min_degree {
            return;
        }
        let min_degree = self.min_degree;
        self.data
            .extend((max - min_degree) as usize, |i| f(i as i32 + min_degree));
    }

    /// Iterates through `(degree, entry)` pairs.
    pub fn iter_enum(&self) -> impl Iterator<Item = (i32, &T)> + '_ {
        let min_degree = self.min_degree;
        self.data
            .iter()
            .enumerate()
            .map(move |(i, t)| (i as i32 + min_degree, t))
    }
}

impl<T> Index<i32> for OnceBiVec<T> {
    type Output = T;

    fn index(&self, degree: i32) -> &T {
        self.get(degree).unwrap_or_else(|| {
            panic!(
                "Degree {degree} not available, range is {}..{}",
                self.min_degree,
                self.len()
            )
        })
    }
}
