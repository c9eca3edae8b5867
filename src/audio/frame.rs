/// Audio sample data (16-bit PCM, interleaved)
#[derive(Debug, Clone, PartialEq)]
pub struct AudioFrame {
    /// Raw audio samples (i16 PCM, interleaved)
    pub samples: Vec<i16>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of channels
    pub channels: u16,
    /// Timestamp in milliseconds since playback started
    pub timestamp_ms: u64,
}

impl AudioFrame {
    /// Duration of this frame in milliseconds
    pub fn duration_ms(&self) -> u64 {
        if self.sample_rate == 0 || self.channels == 0 {
            return 0;
        }
        let frames = self.samples.len() as u64 / self.channels as u64;
        frames * 1000 / self.sample_rate as u64
    }

    /// Little-endian PCM bytes
    pub fn to_pcm_bytes(&self) -> Vec<u8> {
        self.samples.iter().flat_map(|s| s.to_le_bytes()).collect()
    }

    /// Convert to the target format: downmix to mono, then decimate
    ///
    /// Only downsampling by an integer ratio is supported; other rates pass
    /// through unchanged.
    pub fn convert(self, target_sample_rate: u32, target_channels: u16) -> AudioFrame {
        let mut frame = self;

        if target_channels == 1 && frame.channels > 1 {
            frame = frame.to_mono();
        }

        if frame.sample_rate != target_sample_rate {
            frame = frame.downsample(target_sample_rate);
        }

        frame
    }

    /// Average all channels into one
    fn to_mono(self) -> AudioFrame {
        let channels = self.channels as usize;

        let samples = self
            .samples
            .chunks_exact(channels)
            .map(|chunk| {
                let sum: i32 = chunk.iter().map(|&s| s as i32).sum();
                (sum / channels as i32) as i16
            })
            .collect();

        AudioFrame {
            samples,
            sample_rate: self.sample_rate,
            channels: 1,
            timestamp_ms: self.timestamp_ms,
        }
    }

    /// Downsample by decimation (take every Nth sample frame)
    fn downsample(self, target_rate: u32) -> AudioFrame {
        if target_rate == 0 || self.sample_rate % target_rate != 0 {
            return self;
        }

        let ratio = (self.sample_rate / target_rate) as usize;
        if ratio <= 1 {
            return self; // Can't upsample
        }

        let channels = self.channels.max(1) as usize;
        let samples = self
            .samples
            .chunks_exact(channels)
            .step_by(ratio)
            .flatten()
            .copied()
            .collect();

        AudioFrame {
            samples,
            sample_rate: target_rate,
            channels: self.channels,
            timestamp_ms: self.timestamp_ms,
        }
    }
}
