use anyhow::Result;

/// Flat keyed byte store. Key existence is the pipeline's idempotency marker:
/// a present `{id}.json` means "already downloaded", a present artifact file
/// means "already converted".
pub trait Store {
    fn exists(&self, key: &str) -> bool;

    /// Write the whole value for `key`. A record is written in full before
    /// the caller moves on, so interrupted runs never leave partial records
    /// behind under a committed key.
    fn write(&self, key: &str, bytes: &[u8]) -> Result<()>;

    fn read(&self, key: &str) -> Result<Vec<u8>>;

    /// All keys currently present, in stable (sorted) order.
    fn list(&self) -> Result<Vec<String>>;
}
