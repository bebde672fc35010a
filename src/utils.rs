/// A trait that provides easy access to the first element of a slice.
pub trait Front<T> {
    fn front(&self) -> &T;
    fn mut_front(&mut self) -> &mut T;
}

/// A trait that provides easy access to the last element of a slice.
pub trait Back<T> {
    fn back(&self) -> &T;
    fn mut_back(&mut self) -> &mut T;
}

impl<T> Front<T> for [T] {
    #[inline(always)]
    fn front(&self) -> &T {
        &self[0]
    }
    #[inline(always)]
    fn mut_front(&mut self) -> &mut T {
        &mut self[0]
    }
}

impl<T> Back<T> for [T] {
    #[inline(always)]
    fn back(&self) -> &T {
        &self[self.len() - 1]
    }
    #[inline(always)]
    fn mut_back(&mut self) -> &mut T {
        let i = self.len() - 1;
        &mut self[i]
    }
}

/// A trait to replace all elements in a container with zeros.
pub trait ZeroOut {
    fn zero_out(&mut self);
}

impl ZeroOut for f64 {
    fn zero_out(&mut self) {
        *self = 0.0;
    }
}

impl<T> ZeroOut for [T]
where
    T: ZeroOut,
{
    fn zero_out(&mut self) {
        for elem in self {
            elem.zero_out();
        }
    }
}

impl<T> ZeroOut for Vec<T>
where
    T: ZeroOut,
{
    fn zero_out(&mut self) {
        self.as_mut_slice().zero_out();
    }
}

/// Gets a shared view of layer `i` and a mutable view of layer `i + 1`.
pub(crate) fn split_forward<T>(items: &mut [T], i: usize) -> (&T, &mut T) {
    let (before, after) = items[i..].split_at_mut(1);
    (&before[0], &mut after[0])
}

/// Gets a mutable view of layer `i` and a shared view of layer `i + 1`.
pub(crate) fn split_backward<T>(items: &mut [T], i: usize) -> (&mut T, &T) {
    let (before, after) = items[i..].split_at_mut(1);
    (&mut before[0], &after[0])
}

/// Index of the largest value, or `None` for an empty slice.
pub fn argmax(values: &[f64]) -> Option<usize> {
    values
        .iter()
        .enumerate()
        .fold(None, |best: Option<(usize, f64)>, (i, &v)| match best {
            Some((_, b)) if b >= v => best,
            _ => Some((i, v)),
        })
        .map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn front_and_back() {
        let mut v = [1, 2, 3];
        assert_eq!(*v.front(), 1);
        assert_eq!(*v.back(), 3);
        *v.mut_back() = 9;
        *v.mut_front() = 0;
        assert_eq!(v, [0, 2, 9]);
    }

    #[test]
    fn split_views_are_adjacent() {
        let mut v = vec![10, 20, 30];
        let (prev, next) = split_forward(&mut v, 1);
        *next += *prev;
        assert_eq!(v, [10, 20, 50]);

        let (cur, next) = split_backward(&mut v, 0);
        *cur = *next;
        assert_eq!(v, [20, 20, 50]);
    }

    #[test]
    fn argmax_prefers_first_maximum() {
        assert_eq!(argmax(&[]), None);
        assert_eq!(argmax(&[0.1, 0.7, 0.2]), Some(1));
        assert_eq!(argmax(&[0.5, 0.5]), Some(0));
    }

    #[test]
    fn zero_out_nested() {
        let mut v = vec![vec![1.0, 2.0], vec![3.0]];
        v.zero_out();
        assert_eq!(v, vec![vec![0.0, 0.0], vec![0.0]]);
    }
}
