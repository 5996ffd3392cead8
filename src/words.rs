//! Word of the day selection
//!
//! Day zero is the epoch start; each following UTC day (rolling over at 04:00)
//! advances one entry through a fixed list. Once the list runs out there is no
//! word for the day, permanently.

use crate::error::{Error, Result};
use chrono::{DateTime, TimeZone, Utc};
use tracing::{error, info};

const SECONDS_PER_DAY: i64 = 24 * 60 * 60;

const NANOS_PER_DAY: i128 = SECONDS_PER_DAY as i128 * 1_000_000_000;

// `timestamp()` is floored and `timestamp_subsec_nanos()` is always positive
fn nanos_since_unix(t: &DateTime<Utc>) -> i128 {
    t.timestamp() as i128 * 1_000_000_000 + t.timestamp_subsec_nanos() as i128
}

/// Day zero: 2022-03-26 04:00:00 UTC
pub fn epoch_start() -> DateTime<Utc> {
    // 1648267200 == 2022-03-26T04:00:00Z
    DateTime::from_timestamp(1_648_267_200, 0).unwrap_or_default()
}

/// Built-in word list, one entry per day from the epoch start.
///
/// At one word a day this list ran out in early July 2022; from then on every
/// lookup with the default selector fails with `ExhaustedWordList`. Build a
/// `WordSelector` with a longer list (or a later epoch) to keep sending.
pub const WORDS: &[&str] = &[
    "able", "baker", "charlie", "dog", "easy", "fox", "george", "how", "item", "jig",
    "king", "love", "mike", "nan", "oboe", "peter", "queen", "roger", "sugar", "tare",
    "uncle", "victor", "william", "xray", "yoke", "zebra", "anchor", "bramble", "cobble",
    "dapper", "ember", "fable", "gusto", "harbor", "inkling", "jubilee", "kernel",
    "lantern", "marrow", "nimble", "orbit", "pebble", "quarry", "ripple", "saffron",
    "thimble", "umber", "velvet", "wander", "yonder", "zephyr", "amble", "bristle",
    "cinder", "drizzle", "eddy", "flint", "gable", "hollow", "ivory", "jostle",
    "kettle", "lumber", "meadow", "nectar", "outpost", "parcel", "quiver", "rustle",
    "sprocket", "tundra", "utmost", "vessel", "whittle", "yearling", "zenith",
    "acorn", "biscuit", "canopy", "dwindle", "estuary", "fiddle", "granite",
    "hearth", "isthmus", "juniper", "knapsack", "lagoon", "mingle", "nugget",
    "oxbow", "pillar", "quill", "rampart", "sparrow", "trellis", "upland", "vortex",
    "willow", "yarrow",
];

/// Picks the active word from a list for a given moment
#[derive(Debug, Clone)]
pub struct WordSelector {
    epoch: DateTime<Utc>,
    words: Vec<String>,
}

impl WordSelector {
    pub fn new(epoch: DateTime<Utc>, words: Vec<String>) -> Self {
        Self { epoch, words }
    }

    pub fn epoch(&self) -> DateTime<Utc> {
        self.epoch
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Whole days elapsed since the epoch, rounded toward negative infinity.
    /// Any instant before the epoch, even by a nanosecond, is day -1 or lower.
    pub fn days_since_epoch<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> i64 {
        let elapsed = nanos_since_unix(&now.with_timezone(&Utc)) - nanos_since_unix(&self.epoch);
        elapsed.div_euclid(NANOS_PER_DAY) as i64
    }

    /// The word for the day containing `now`
    pub fn todays_word<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Result<&str> {
        let days = self.days_since_epoch(now);

        let word = usize::try_from(days)
            .ok()
            .and_then(|idx| self.words.get(idx));

        match word {
            Some(word) => {
                info!(days, word = %word, "Today's word is: {}", word);
                Ok(word)
            }
            None => {
                error!(days, len = self.words.len(), "Words list out of indices");
                Err(Error::ExhaustedWordList {
                    days,
                    len: self.words.len(),
                })
            }
        }
    }
}

impl Default for WordSelector {
    fn default() -> Self {
        Self::new(epoch_start(), WORDS.iter().map(|w| w.to_string()).collect())
    }
}
