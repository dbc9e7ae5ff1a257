use auvgate_frame::{TuningChannel, TuningFrame};

/// Pending gains for one controller channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TuningEntry {
    pub channel: TuningChannel,
    pub p: f32,
    pub i: f32,
    pub d: f32,
    dirty: bool,
    revision: u64,
}

impl TuningEntry {
    /// True until the current gains have been sent to the vehicle.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Bumped on every update; used to match acknowledgements.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn frame(&self) -> TuningFrame {
        TuningFrame {
            channel: self.channel,
            p: self.p,
            i: self.i,
            d: self.d,
        }
    }
}

/// Tuning entries keyed by channel, at most one per channel, in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TuningTable {
    entries: Vec<TuningEntry>,
    next_revision: u64,
}

impl TuningTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the gains of `channel`, or append a new entry. Marks it dirty.
    pub fn upsert(&mut self, channel: TuningChannel, p: f32, i: f32, d: f32) -> &TuningEntry {
        self.next_revision += 1;
        let revision = self.next_revision;

        let index = match self.entries.iter().position(|e| e.channel == channel) {
            Some(index) => index,
            None => {
                self.entries.push(TuningEntry {
                    channel,
                    p,
                    i,
                    d,
                    dirty: true,
                    revision,
                });
                self.entries.len() - 1
            }
        };

        let entry = &mut self.entries[index];
        entry.p = p;
        entry.i = i;
        entry.d = d;
        entry.dirty = true;
        entry.revision = revision;
        entry
    }

    pub fn get(&self, channel: TuningChannel) -> Option<&TuningEntry> {
        self.entries.iter().find(|e| e.channel == channel)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TuningEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Selection policy for tuning frames: the first dirty entry in
    /// insertion order.
    pub fn first_dirty(&self) -> Option<&TuningEntry> {
        self.entries.iter().find(|e| e.dirty)
    }

    pub fn has_dirty(&self) -> bool {
        self.first_dirty().is_some()
    }

    /// Clear the dirty flag after `revision` of `channel` went out.
    ///
    /// Returns false, leaving the entry dirty, if it has been updated
    /// since that revision was selected.
    pub fn mark_sent(&mut self, channel: TuningChannel, revision: u64) -> bool {
        match self.entries.iter_mut().find(|e| e.channel == channel) {
            Some(entry) if entry.revision == revision => {
                entry.dirty = false;
                true
            }
            _ => false,
        }
    }
}
