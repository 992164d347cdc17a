use std::fs;
use std::path::Path;

use miette::{miette, IntoDiagnostic, Result};

use crate::asm::LOAD_ORIGIN;
use crate::runtime::{Context, MEMORY_MAX};

/// Two little-endian u32 counts precede the program bytes.
const HEADER_LEN: usize = 8;

impl Context {
    /// Writes the loaded program as a binary image: `num_bytes` and
    /// `num_commands` as little-endian u32, then the program itself.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let start = LOAD_ORIGIN as usize;
        let len = self.num_bytes() as usize;
        let mut image = Vec::with_capacity(HEADER_LEN + len);
        image.extend_from_slice(&(self.num_bytes() as u32).to_le_bytes());
        image.extend_from_slice(&(self.num_commands() as u32).to_le_bytes());
        image.extend_from_slice(&self.mem()[start..start + len]);
        fs::write(path, image).into_diagnostic()
    }

    /// Loads a binary image at the load origin and returns its byte count.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<usize> {
        let image = fs::read(path).into_diagnostic()?;
        if image.len() < HEADER_LEN {
            return Err(miette!(
                code = "image::truncated",
                "Image file is shorter than its header"
            ));
        }
        let num_bytes =
            u32::from_le_bytes([image[0], image[1], image[2], image[3]]) as usize;
        let num_commands =
            u32::from_le_bytes([image[4], image[5], image[6], image[7]]) as usize;
        let body = &image[HEADER_LEN..];
        if body.len() < num_bytes {
            return Err(miette!(
                code = "image::truncated",
                "Image file is shorter than its header claims"
            ));
        }
        if num_bytes > MEMORY_MAX - LOAD_ORIGIN as usize {
            return Err(miette!(
                code = "image::too_large",
                "Image does not fit in memory above the load origin"
            ));
        }
        self.load_image(&body[..num_bytes], num_commands);
        Ok(num_bytes)
    }
}

#[cfg(test)]
mod test {
    use std::fs;
    use std::path::PathBuf;

    use crate::runtime::Context;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("kim-{}-{}", std::process::id(), name))
    }

    #[test]
    fn image_round_trips_bit_for_bit() {
        let path = temp_path("roundtrip.prg");
        let mut ctx = Context::new();
        ctx.assemble("LDA #$01\nSTA $0200\nLDA #$05\nSTA $0201\nBRK\n")
            .unwrap();
        ctx.save(&path).unwrap();

        let mut loaded = Context::new();
        let bytes = loaded.load(&path).unwrap();
        assert_eq!(bytes, ctx.num_bytes() as usize);
        assert_eq!(loaded.num_commands(), ctx.num_commands());
        for addr in 0x0600..0x0600 + ctx.num_bytes() {
            assert_eq!(loaded.read(addr), ctx.read(addr));
        }

        loaded.run().unwrap();
        assert_eq!(loaded.read(0x0200), 0x01);
        assert_eq!(loaded.read(0x0201), 0x05);

        fs::remove_file(path).unwrap();
    }

    #[test]
    fn truncated_image_is_rejected() {
        let path = temp_path("short.prg");
        fs::write(&path, [0x05, 0x00, 0x00]).unwrap();
        let err = Context::new().load(&path).unwrap_err();
        assert_eq!(err.code().unwrap().to_string(), "image::truncated");
        fs::remove_file(path).unwrap();
    }

    #[test]
    fn lying_header_is_rejected() {
        let path = temp_path("lying.prg");
        // Header claims 16 bytes, body has 2.
        let mut image = vec![16, 0, 0, 0, 1, 0, 0, 0];
        image.extend_from_slice(&[0xA9, 0x01]);
        fs::write(&path, image).unwrap();
        let err = Context::new().load(&path).unwrap_err();
        assert_eq!(err.code().unwrap().to_string(), "image::truncated");
        fs::remove_file(path).unwrap();
    }
}
