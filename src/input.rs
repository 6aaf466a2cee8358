use flate2::read::GzDecoder;

use std::{collections::VecDeque, fs::File, io::Read};

/// One input file
pub enum Input {
    Plain(File),
    Gzip(GzDecoder<File>),
}

impl Read for Input {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self {
            Self::Plain(r) => r.read(buf),
            Self::Gzip(r) => r.read(buf),
        }
    }
}

impl Input {
    /// Opens `path`, gzip decompression is selected by the ".gz" extension
    pub fn open(path: &str) -> Self {
        let fd = File::open(path).unwrap_or_else(|e| panic!("Failed to open {}: {}", path, e));

        if path.ends_with(".gz") {
            Self::Gzip(GzDecoder::new(fd))
        } else {
            Self::Plain(fd)
        }
    }
}

/// Input files, consumed one after the other
#[derive(Default)]
pub struct Inputs {
    inputs: VecDeque<Input>,
}

impl Inputs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stack(&mut self, input: Input) {
        self.inputs.push_back(input);
    }

    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }
}

impl Read for Inputs {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        while let Some(input) = self.inputs.front_mut() {
            let size = input.read(buf)?;
            if size > 0 {
                return Ok(size);
            }
            self.inputs.pop_front();
        }
        Ok(0)
    }
}
