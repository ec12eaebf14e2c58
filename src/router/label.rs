//! The closed set of routing labels.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::domains::Domain;

/// Which agent a message belongs to. `General` is the catch-all.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum RoutingLabel {
    Calendar,
    Social,
    Invoice,
    Email,
    Crm,
    #[default]
    General,
}

impl RoutingLabel {
    /// The domain agent bound to this label; `None` for `General`.
    pub fn domain(self) -> Option<Domain> {
        match self {
            Self::Calendar => Some(Domain::Calendar),
            Self::Social => Some(Domain::Social),
            Self::Invoice => Some(Domain::Invoice),
            Self::Email => Some(Domain::Email),
            Self::Crm => Some(Domain::Crm),
            Self::General => None,
        }
    }
}

impl From<Domain> for RoutingLabel {
    fn from(domain: Domain) -> Self {
        match domain {
            Domain::Calendar => Self::Calendar,
            Domain::Social => Self::Social,
            Domain::Invoice => Self::Invoice,
            Domain::Email => Self::Email,
            Domain::Crm => Self::Crm,
        }
    }
}
