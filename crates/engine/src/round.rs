use guess_that_song_core::{Track, TrackOption, TrackPool};
use rand::seq::SliceRandom;
use rand::Rng;

/// One quiz question: the track being previewed and the three choices shown
/// for it, already in display order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Round {
    correct: Track,
    options: [TrackOption; 3],
}

impl Round {
    /// Picks the correct track uniformly, takes two distractors from a
    /// partial Fisher-Yates shuffle of the remaining tracks, then shuffles
    /// the display order.
    pub fn draw<R: Rng>(pool: &TrackPool, rng: &mut R) -> Self {
        let tracks = pool.tracks();
        let correct = &tracks[rng.gen_range(0..tracks.len())];

        // The pool holds at least three tracks with distinct ids.
        let mut rest: Vec<&Track> = tracks.iter().filter(|t| t.id != correct.id).collect();
        let (distractors, _) = rest.partial_shuffle(rng, 2);

        let mut options = [
            TrackOption::from(correct),
            TrackOption::from(distractors[0]),
            TrackOption::from(distractors[1]),
        ];
        options.shuffle(rng);

        Self {
            correct: correct.clone(),
            options,
        }
    }

    pub fn correct(&self) -> &Track {
        &self.correct
    }

    pub fn options(&self) -> &[TrackOption; 3] {
        &self.options
    }

    pub fn is_correct(&self, option_id: u64) -> bool {
        self.correct.id == option_id
    }
}

#[cfg(test)]
mod tests {
    use super::Round;
    use guess_that_song_core::{Track, TrackPool};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn pool(size: u64) -> TrackPool {
        TrackPool::new(
            (1..=size)
                .map(|id| Track {
                    id,
                    title: format!("Song {id}"),
                    artist: format!("Artist {id}"),
                    album: None,
                    preview_url: format!("https://example.com/{id}.m4a"),
                })
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn options_are_three_unique_and_include_correct() {
        let pool = pool(40);
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..500 {
            let round = Round::draw(&pool, &mut rng);
            let ids: HashSet<u64> = round.options().iter().map(|o| o.id).collect();
            assert_eq!(ids.len(), 3);
            assert!(ids.contains(&round.correct().id));
            assert!(round.is_correct(round.correct().id));
        }
    }

    #[test]
    fn minimal_pool_uses_every_track() {
        let pool = pool(3);
        let mut rng = StdRng::seed_from_u64(42);
        let mut correct_positions = HashSet::new();

        for _ in 0..300 {
            let round = Round::draw(&pool, &mut rng);
            let mut ids: Vec<u64> = round.options().iter().map(|o| o.id).collect();
            let position = ids
                .iter()
                .position(|id| *id == round.correct().id)
                .unwrap();
            correct_positions.insert(position);
            ids.sort_unstable();
            assert_eq!(ids, vec![1, 2, 3]);
        }

        // display order is still randomized with only three tracks
        assert_eq!(correct_positions.len(), 3);
    }

    #[test]
    fn correct_track_choice_covers_pool() {
        let pool = pool(5);
        let mut rng = StdRng::seed_from_u64(3);
        let mut seen = HashSet::new();

        for _ in 0..500 {
            seen.insert(Round::draw(&pool, &mut rng).correct().id);
        }

        assert_eq!(seen.len(), 5);
    }

    #[test]
    fn options_carry_display_fields_of_their_tracks() {
        let pool = pool(10);
        let mut rng = StdRng::seed_from_u64(11);
        let round = Round::draw(&pool, &mut rng);

        for option in round.options() {
            let track = pool.get(option.id).unwrap();
            assert_eq!(option.title, track.title);
            assert_eq!(option.artist, track.artist);
        }
    }
}
