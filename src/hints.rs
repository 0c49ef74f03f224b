//! Analyst hints for the PIN exercise, in the order a learner would want them.

use plotters::style::{BLUE, GREEN, RED};

use crate::plot::Guide;

pub struct Hint {
    pub number: usize,
    pub title: &'static str,
    pub body: &'static str,
}

static HINTS: [Hint; 7] = [
    Hint {
        number: 1,
        title: "Repeat the same guess",
        body: "\
For this exercise the shape of a power trace depends on the code being run and the data it runs
on. Two identical runs should therefore look alike, apart from a little noise that smoothing
irons out. The occasional trace that looks completely different can be treated as noise.

Two things can change between inputs:

  - Same code path, different data. Features (spikes) stay at the same horizontal positions
    but their height and shape change; a spike for one input may be a dip for another.
  - Different code paths. When one input takes a longer branch or stays in a loop for longer,
    every feature after that point shifts to the right.

    door unlock 0000 --repeat 4 --smooth 25",
    },
    Hint {
        number: 2,
        title: "Clean up the picture",
        body: "\
Raw traces are noisy. `--smooth W` runs a W-sample moving average over each trace and keeps it
aligned with unsmoothed traces on the same axis. `--crop START END` zooms into a window of sample
indices, and `--decimate N` keeps only every Nth sample for long captures.

    door unlock 0000 1000 --smooth 25 --crop 900 1000",
    },
    Hint {
        number: 3,
        title: "Read the comparison routine",
        body: "\
A simplified `strcmp`:

    int strcmp(const char* s1, const char* s2) {
        while(*s1 && (*s1 == *s2)) {
            s1++;
            s2++;
        }
        return *s1 - *s2;
    }

If `s1` is your guess and `s2` the stored password, which of its behaviours could change the
structure of the power trace?",
    },
    Hint {
        number: 4,
        title: "Two leaks",
        body: "\
The loop stops at the first differing character. A guess whose first two characters match runs
one iteration longer than a guess where only the first matches, so features of the better guess
are delayed after some point in the trace.

The return value is negative when the guess sorts below the password and positive when it sorts
above. Code that depends on that sign produces a different feature, without any shift in time,
for guesses that are too low versus too high.",
    },
    Hint {
        number: 5,
        title: "Start with the first digit",
        body: "\
The first character is always compared, so every possible first digit leaves its mark on the
trace. Fix the remaining digits and vary only the first one.",
    },
    Hint {
        number: 6,
        title: "Sweep the first digit",
        body: "\
Plot all ten first digits cropped to [900, 1000], with guides marking the groups:

    door sweep --width 4 --smooth 25 --crop 900 1000 --guides

Around x=[925, 970] the traces fall into three groups:

  1. traces that dip to a low point near x=975 (green guide)
  2. traces that rise to around x=970 and keep going (blue guide)
  3. a single trace that fits neither group (red guide)

Which first digit is correct? What do the traces in group 1 have in common, and what about the
odd one out? How does that help with the next digit?",
    },
    Hint {
        number: 7,
        title: "Interpreting the sweep",
        body: "\
6 is the correct first digit. Every guess in group 1 is below the correct digit and every guess
in group 2 is above it.

If that holds for later digits too, guesses lower than the correct character dip and guesses
higher than it rise. The trace for 6000 dips after x=940 like group 1 did, which suggests the
second digit is greater than 0:

    door sweep --prefix 6 --width 4 --smooth 25 --crop 900 1100",
    },
];

/// Rough paths of the three trace groups described in hint 6, for the first-digit sweep cropped
/// to [900, 1000].
pub fn sweep_guides() -> Vec<Guide> {
    vec![
        Guide::new(vec![(925.0, 0.0199), (975.0, 0.0145)], GREEN),
        Guide::new(vec![(925.0, 0.0189), (970.0, 0.0205)], BLUE),
        Guide::new(
            vec![(925.0, 0.0199), (940.0, 0.0205), (972.0, 0.015), (990.0, 0.0138)],
            RED,
        ),
    ]
}

pub fn get(number: usize) -> Option<&'static Hint> {
    HINTS.iter().find(|h| h.number == number)
}

pub fn all() -> impl Iterator<Item = &'static Hint> {
    HINTS.iter()
}

#[cfg(test)]
mod test {
    use super::*;
    use plotters::style::Color;

    #[test]
    fn test_hint_lookup() {
        assert_eq!(all().count(), 7);
        assert_eq!(get(3).unwrap().title, "Read the comparison routine");
        assert!(get(0).is_none());
        assert!(get(8).is_none());

        for (i, hint) in all().enumerate() {
            assert_eq!(hint.number, i + 1);
        }
    }

    #[test]
    fn test_sweep_guides() {
        let guides = sweep_guides();
        assert_eq!(guides.len(), 3);
        assert_eq!(guides[0].color.rgb(), GREEN.rgb());
        assert_eq!(guides[2].points.len(), 4);

        // every guide sits inside the crop window the hint uses
        for (x, _) in guides.iter().flat_map(|g| g.points.iter()) {
            assert!((900.0..1000.0).contains(x));
        }
    }
}
