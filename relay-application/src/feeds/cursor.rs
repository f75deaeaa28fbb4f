use relay_domain::FeedRecord;

/// Last record a feed has handed to its presenter, ordered by
/// `(created_at, id)`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedCursor {
    primed: bool,
    position: Option<(i64, String)>,
}

impl FeedCursor {
    pub fn is_primed(&self) -> bool {
        self.primed
    }

    /// Starts the cursor at the newest stored record so history is not
    /// re-posted after a restart.
    pub fn prime(&mut self, latest: Option<&FeedRecord>) {
        self.primed = true;
        self.position = latest.map(|record| (record.created_at, record.id.clone()));
    }

    pub fn position(&self) -> Option<(i64, &str)> {
        self.position
            .as_ref()
            .map(|(created_at, id)| (*created_at, id.as_str()))
    }

    /// Advances past `record` if it is strictly newer, returning whether it
    /// should be presented. Duplicates and older records return false.
    pub fn observe(&mut self, record: &FeedRecord) -> bool {
        let newer = match self.position() {
            Some(position) => (record.created_at, record.id.as_str()) > position,
            None => true,
        };
        if newer {
            self.primed = true;
            self.position = Some((record.created_at, record.id.clone()));
        }
        newer
    }
}
