//! Persistent high-score table.
//!
//! Scores live in a tiny flat-text block, one `score:KIND` line per entry,
//! sorted descending and capped at ten lines. The byte store behind it is
//! pluggable: flash on the badge, a heap buffer in tests. Store failures
//! never escape this module; a round must not crash because a sector
//! write failed.

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt::Write as _;

/// Entries kept after each save.
pub const MAX_ENTRIES: usize = 10;
/// Upper bound on the serialized table; ten `4294967295:HUMAN\n` lines fit
/// with room to spare.
pub const STORE_CAPACITY: usize = 256;

macro_rules! store_warn {
    ($($arg:tt)*) => {{
        #[cfg(feature = "defmt")]
        defmt::warn!($($arg)*);
    }};
}

/// Who earned a score.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PlayerKind {
    Demo,
    Human,
}

impl PlayerKind {
    pub fn as_str(self) -> &'static str {
        match self {
            PlayerKind::Demo => "DEMO",
            PlayerKind::Human => "HUMAN",
        }
    }

    fn from_str(s: &str) -> Option<Self> {
        match s {
            "DEMO" => Some(PlayerKind::Demo),
            "HUMAN" => Some(PlayerKind::Human),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Entry {
    pub score: u32,
    pub kind: PlayerKind,
}

/// Raw byte storage for the serialized table.
pub trait ScoreStore {
    type Error;

    /// Read the store contents into `buf`, returning the byte count.
    fn load(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error>;

    /// Replace the store contents with `data`.
    fn save(&mut self, data: &[u8]) -> Result<(), Self::Error>;
}

pub struct Leaderboard<S> {
    store: S,
}

impl<S: ScoreStore> Leaderboard<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Insert a score, keep the table sorted descending and capped, and
    /// rewrite the store. A failed write drops the score silently.
    pub fn save_score(&mut self, score: u32, kind: PlayerKind) {
        let mut entries = self.load_scores();
        entries.push(Entry { score, kind });
        // Stable sort: a new score ranks below existing equal scores.
        entries.sort_by(|a, b| b.score.cmp(&a.score));
        entries.truncate(MAX_ENTRIES);

        let mut text = String::new();
        for entry in &entries {
            let _ = writeln!(text, "{}:{}", entry.score, entry.kind.as_str());
        }
        if self.store.save(text.as_bytes()).is_err() {
            store_warn!("leaderboard: write failed, score {} lost", score);
        }
    }

    /// Read the table back. Any read or parse failure yields an empty
    /// list, never a partial one.
    pub fn load_scores(&mut self) -> Vec<Entry> {
        let mut buf = [0u8; STORE_CAPACITY];
        let len = match self.store.load(&mut buf) {
            Ok(len) => len.min(STORE_CAPACITY),
            Err(_) => {
                store_warn!("leaderboard: read failed");
                return Vec::new();
            }
        };
        match parse(&buf[..len]) {
            Some(entries) => entries,
            None => {
                store_warn!("leaderboard: store contents unreadable");
                Vec::new()
            }
        }
    }

    /// Highest stored score, or 0 with an empty table.
    pub fn high_score(&mut self) -> u32 {
        self.load_scores().first().map_or(0, |entry| entry.score)
    }
}

fn parse(bytes: &[u8]) -> Option<Vec<Entry>> {
    let text = core::str::from_utf8(bytes).ok()?;
    let mut entries = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        // A line without a separator is skipped; a line that has one but
        // does not parse poisons the whole load.
        let Some((score, kind)) = line.split_once(':') else {
            continue;
        };
        let score: u32 = score.parse().ok()?;
        let kind = PlayerKind::from_str(kind)?;
        entries.push(Entry { score, kind });
    }
    Some(entries)
}
