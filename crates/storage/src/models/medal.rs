/// Recognition tier earned by cumulative yearly points.
///
/// Variants are declared lowest tier first so that `Ord` follows the tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Medal {
    Bronce,
    Plata,
    Oro,
    RiderDeHierro,
}

/// Thresholds evaluated highest first.
static THRESHOLDS: [(u64, Medal); 4] = [
    (50, Medal::RiderDeHierro),
    (30, Medal::Oro),
    (15, Medal::Plata),
    (5, Medal::Bronce),
];

impl Medal {
    pub fn for_points(points: u64) -> Option<Self> {
        THRESHOLDS
            .iter()
            .find(|(min, _)| points >= *min)
            .map(|(_, medal)| *medal)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Bronce => "Bronce",
            Self::Plata => "Plata",
            Self::Oro => "Oro",
            Self::RiderDeHierro => "Rider de Hierro",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            Self::Bronce => "#CD7F32",
            Self::Plata => "#C0C0C0",
            Self::Oro => "#FFD700",
            Self::RiderDeHierro => "#6B6E70",
        }
    }

    pub fn min_points(&self) -> u64 {
        THRESHOLDS
            .iter()
            .find(|(_, medal)| medal == self)
            .map(|(min, _)| *min)
            .unwrap_or(0)
    }

    /// Every tier, highest first.
    pub fn tiers() -> impl Iterator<Item = Medal> {
        THRESHOLDS.iter().map(|(_, medal)| *medal)
    }
}
