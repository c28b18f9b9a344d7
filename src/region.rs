//! O conjunto fechado de regiões dos EUA e o catálogo de estados.
//!
//! A ordem de declaração de [`Region`] é a ordem do catálogo. Ela define o
//! texto do prompt, o reparo de respostas e o desempate em [`resolve_by_states`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Uma das cinco categorias geográficas de um parque.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Region {
    Northeast,
    Midwest,
    South,
    West,
    Territories,
}

/// Todas as regiões, na ordem do catálogo.
pub const REGIONS: [Region; 5] = [
    Region::Northeast,
    Region::Midwest,
    Region::South,
    Region::West,
    Region::Territories,
];

/// Último recurso quando o modelo responde algo sem sentido e nenhum estado bate.
pub const DEFAULT_REGION: Region = Region::West;

impl Region {
    /// O nome como gravado no campo de seleção do Airtable.
    pub fn as_str(self) -> &'static str {
        match self {
            Region::Northeast => "Northeast",
            Region::Midwest => "Midwest",
            Region::South => "South",
            Region::West => "West",
            Region::Territories => "Territories",
        }
    }

    /// Estados e territórios membros, na ordem do catálogo.
    pub fn states(self) -> &'static [&'static str] {
        match self {
            Region::Northeast => &[
                "Maine",
                "New Hampshire",
                "Vermont",
                "Massachusetts",
                "Rhode Island",
                "Connecticut",
                "New York",
                "New Jersey",
                "Pennsylvania",
            ],
            Region::Midwest => &[
                "Ohio",
                "Michigan",
                "Indiana",
                "Wisconsin",
                "Illinois",
                "Minnesota",
                "Iowa",
                "Missouri",
                "North Dakota",
                "South Dakota",
                "Nebraska",
                "Kansas",
            ],
            Region::South => &[
                "Delaware",
                "Maryland",
                "Virginia",
                "West Virginia",
                "Kentucky",
                "North Carolina",
                "South Carolina",
                "Tennessee",
                "Georgia",
                "Florida",
                "Alabama",
                "Mississippi",
                "Arkansas",
                "Louisiana",
                "Oklahoma",
                "Texas",
            ],
            Region::West => &[
                "Colorado",
                "Wyoming",
                "Montana",
                "Idaho",
                "Utah",
                "Nevada",
                "Washington",
                "Oregon",
                "California",
                "Arizona",
                "New Mexico",
            ],
            Region::Territories => &[
                "Alaska",
                "Hawaii",
                "Puerto Rico",
                "Guam",
                "American Samoa",
                "U.S. Virgin Islands",
                "Northern Mariana Islands",
            ],
        }
    }

    /// Teste de pertinência por igualdade exata.
    pub fn contains(self, state: &str) -> bool {
        self.states().contains(&state)
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown region: {0}")]
pub struct UnknownRegion(pub String);

impl FromStr for Region {
    type Err = UnknownRegion;

    /// Igualdade exata, diferenciando maiúsculas, com os nomes do catálogo.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        REGIONS
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| UnknownRegion(s.to_string()))
    }
}

/// Regiões que contêm `state`. Dados bem formados produzem no máximo uma.
pub fn regions_for_state(state: &str) -> Vec<Region> {
    REGIONS.into_iter().filter(|r| r.contains(state)).collect()
}

/// Catálogo com uma região por linha, no formato `Region: State, State, ...`.
pub fn catalog_text() -> String {
    REGIONS
        .iter()
        .map(|r| format!("{r}: {}", r.states().join(", ")))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Escolhe a região que contém mais `states`.
///
/// Empates ficam com a região declarada primeiro. Retorna `None` se nada bater.
pub fn resolve_by_states<S: AsRef<str>>(states: &[S]) -> Option<Region> {
    let mut counts = [0usize; REGIONS.len()];
    for state in states {
        for region in regions_for_state(state.as_ref()) {
            counts[region as usize] += 1;
        }
    }

    let mut best: Option<(Region, usize)> = None;
    for (region, count) in REGIONS.into_iter().zip(counts) {
        // Estritamente maior: a região mais antiga fica com o empate.
        if count > best.map_or(0, |(_, c)| c) {
            best = Some((region, count));
        }
    }
    best.map(|(region, _)| region)
}
