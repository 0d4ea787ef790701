use std::{fs, io, path::Path};

use ordered_float::OrderedFloat;

pub fn create_folder_if_not_exists(dir: impl AsRef<Path>) -> io::Result<()> {
    fs::create_dir_all(dir)
}

/// Splits chronologically ordered values into `(head, tail)` where the head holds
/// `floor(len * fraction)` of the oldest values.
pub fn split_chronological<T>(mut values: Vec<T>, fraction: f64) -> (Vec<T>, Vec<T>) {
    let head_len = ((values.len() as f64) * fraction.clamp(0., 1.)).floor() as usize;
    let tail = values.split_off(head_len.min(values.len()));
    (values, tail)
}

/// Index of the largest value. Ties resolve to the earliest index.
pub fn argmax<I: IntoIterator<Item = f32>>(values: I) -> Option<usize> {
    values
        .into_iter()
        .enumerate()
        .fold(None, |best: Option<(usize, OrderedFloat<f32>)>, (index, value)| {
            let value = OrderedFloat(value);
            match best {
                Some((_, best_value)) if value <= best_value => best,
                _ => Some((index, value)),
            }
        })
        .map(|(index, _)| index)
}
