pub mod status;
#[cfg(test)]
pub(crate) mod testing;
