use image::GrayImage;

/// Value of an "on" sample in a `DifferenceMask`.
pub const MASK_ON: u8 = 255;

/// Sum of the mask sample values for one cycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AnomalyScore(pub u64);

impl AnomalyScore {
    pub fn value(self) -> u64 {
        self.0
    }

    /// True when the score strictly exceeds the area threshold.
    pub fn exceeds(self, area_threshold: u64) -> bool {
        self.0 > area_threshold
    }
}

impl std::fmt::Display for AnomalyScore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Binary grid: each sample is `0` or `MASK_ON`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DifferenceMask {
    image: GrayImage,
}

impl DifferenceMask {
    pub(crate) fn from_gray(image: GrayImage) -> Self {
        Self { image }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    pub fn samples(&self) -> &[u8] {
        self.image.as_raw()
    }

    /// Number of "on" samples.
    pub fn lit_count(&self) -> usize {
        self.samples().iter().filter(|&&v| v == MASK_ON).count()
    }

    /// Sum of sample values.
    pub fn score(&self) -> AnomalyScore {
        AnomalyScore(self.samples().iter().map(|&v| v as u64).sum())
    }
}

/// Outcome of scoring one comparison frame against the baseline.
#[derive(Clone, Debug)]
pub struct Observation {
    pub score: AnomalyScore,
    pub mask: DifferenceMask,
}
