/// Types implementing `SpoolSerialisable` can be written back to the driver
/// as reply lines.
pub trait SpoolSerialisable {
    /// Converts the value in question to one or more LF-terminated reply lines.
    fn serialise_spool(&self) -> Vec<u8>;
}
