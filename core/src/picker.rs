use crate::*;

/// Chooses the target of the next round among the cells that are still empty.
pub trait CellPicker {
    /// Returns one of `candidates`, or `None` when there is nothing to pick.
    fn pick(&mut self, candidates: &[Coord2]) -> Option<Coord2>;
}

impl<F> CellPicker for F
where
    F: FnMut(&[Coord2]) -> Option<Coord2>,
{
    fn pick(&mut self, candidates: &[Coord2]) -> Option<Coord2> {
        self(candidates)
    }
}

/// Uniformly random picker backed by a seeded small RNG, so games can be replayed from their seed.
#[derive(Clone, Debug)]
pub struct RandomCellPicker {
    rng: rand::rngs::SmallRng,
}

impl RandomCellPicker {
    pub fn new(seed: u64) -> Self {
        use rand::prelude::*;

        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }
}

impl CellPicker for RandomCellPicker {
    fn pick(&mut self, candidates: &[Coord2]) -> Option<Coord2> {
        use rand::prelude::*;

        if candidates.is_empty() {
            return None;
        }
        let index = self.rng.random_range(0..candidates.len());
        Some(candidates[index])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    #[test]
    fn same_seed_replays_same_picks() {
        let candidates: Vec<Coord2> = Board::new(5).coords().collect();
        let mut a = RandomCellPicker::new(42);
        let mut b = RandomCellPicker::new(42);

        for _ in 0..20 {
            assert_eq!(a.pick(&candidates), b.pick(&candidates));
        }
    }

    #[test]
    fn picks_only_from_candidates() {
        let candidates = [(1, 2), (3, 4), (5, 6)];
        let mut picker = RandomCellPicker::new(7);

        for _ in 0..50 {
            let pick = picker.pick(&candidates).unwrap();
            assert!(candidates.contains(&pick));
        }
    }

    #[test]
    fn picks_spread_evenly_over_candidates() {
        let candidates: Vec<Coord2> = Board::new(2).coords().collect();
        let mut picker = RandomCellPicker::new(11);
        let mut hits = [0u32; 4];

        for _ in 0..4000 {
            let pick = picker.pick(&candidates).unwrap();
            let index = candidates.iter().position(|&c| c == pick).unwrap();
            hits[index] += 1;
        }

        for count in hits {
            assert!((800..=1200).contains(&count), "uneven picks {:?}", hits);
        }
    }

    #[test]
    fn nothing_to_pick_from_empty_slice() {
        let mut picker = RandomCellPicker::new(0);

        assert_eq!(picker.pick(&[]), None);
    }

    #[test]
    fn closures_act_as_pickers() {
        let mut first = |candidates: &[Coord2]| candidates.first().copied();

        assert_eq!(first.pick(&[(2, 2), (0, 0)]), Some((2, 2)));
    }
}
