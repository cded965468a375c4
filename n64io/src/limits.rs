use crate::error::*;
use log::debug;
use std::fs;
use std::path::Path;

/// Default ceiling for a single input file.
pub const DEFAULT_MAX_INPUT_SIZE: u64 = 64 * 1024 * 1024;

/// Resource guards applied before any input is parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub max_input_size: u64,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_input_size: DEFAULT_MAX_INPUT_SIZE,
        }
    }
}

impl Limits {
    pub fn check_len(&self, len: u64) -> Result<()> {
        if len > self.max_input_size {
            return Err(CursorError::InputTooLarge {
                len,
                max: self.max_input_size,
            });
        }
        Ok(())
    }
}

/// Reads a whole file into memory, refusing files above `limits`.
pub fn read_input(path: &Path, limits: &Limits) -> Result<Vec<u8>> {
    let len = fs::metadata(path)?.len();
    limits.check_len(len)?;
    debug!("reading {} ({} bytes)", path.display(), len);
    Ok(fs::read(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_oversized_input() {
        let limits = Limits { max_input_size: 16 };
        assert!(limits.check_len(16).is_ok());
        assert!(matches!(
            limits.check_len(17),
            Err(CursorError::InputTooLarge { len: 17, max: 16 })
        ));
    }
}
