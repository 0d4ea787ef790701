use rand::Rng;
use std::fmt::Debug;

use crate::error::TraderError;

pub trait Action: Debug + Copy + Clone + TryFrom<u32, Error = TraderError> + Into<u32> {
    fn random(rng: &mut impl Rng) -> Self {
        Self::enumerate()[rng.gen_range(0..Self::size())]
    }

    fn enumerate() -> Vec<Self>;

    fn size() -> usize {
        Self::enumerate().len()
    }

    fn index(self) -> usize {
        Into::<u32>::into(self) as usize
    }
}
