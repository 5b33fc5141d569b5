use std::{collections::HashSet, hash::Hash};

pub trait SliceUtil<T> {
    /// Returns the first value that appears twice.
    fn first_duplicate(&self) -> Option<&T>;

    fn is_unique(&self) -> bool {
        self.first_duplicate().is_none()
    }
}

impl<T: Eq + Hash> SliceUtil<T> for [T] {
    fn first_duplicate(&self) -> Option<&T> {
        let mut seen = HashSet::new();
        self.iter().find(|item| !seen.insert(*item))
    }
}

impl<T: Eq + Hash> SliceUtil<T> for Vec<T> {
    fn first_duplicate(&self) -> Option<&T> {
        self.as_slice().first_duplicate()
    }
}

#[macro_export]
macro_rules! assert_unique {
    ($slice:expr) => {{
        use $crate::slice::SliceUtil;
        let slice = &$slice;
        if let Some(duplicate) = slice.first_duplicate() {
            panic!(
                "expected `{}` to be unique; {:?} appears twice in {:?}",
                stringify!($slice),
                duplicate,
                slice,
            );
        }
    }};
}

#[macro_export]
macro_rules! assert_empty {
    ($slice:expr) => {{
        match &$slice[..] {
            [] => {}
            actual => panic!("expected `{}` to be empty; actual={:?}", stringify!($slice), actual),
        }
    }};
}
