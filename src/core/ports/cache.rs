use crate::core::draft::DraftSnapshot;
use crate::error::Error;

/// Local persistence of the in-progress draft under one named entry, so a
/// failed remote save leaves a copy to retry from.
pub trait DraftCache {
    fn store(&self, snapshot: &DraftSnapshot) -> Result<(), Error>;
    fn load(&self) -> Result<Option<DraftSnapshot>, Error>;
    fn clear(&self) -> Result<(), Error>;
}
