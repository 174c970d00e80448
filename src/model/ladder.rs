use crate::model::{
    constants::{DEFAULT_LEVEL, LADDER_SIZE, LEVELS_PER_GRADE},
    error::GradingError,
    structures::{
        grade::Grade,
        grade_tier::{parse_code, GradeTier}
    }
};
use std::{collections::HashMap, str::FromStr};
use strum::IntoEnumIterator;

/// The 12 grade tiers in their global order, `L:1` through `P:3`.
///
/// Built once and shared by reference; nothing mutates it after [`GradeLadder::setup`].
#[derive(Debug, Clone, PartialEq)]
pub struct GradeLadder {
    tiers: Vec<GradeTier>,
    codes: HashMap<String, usize>
}

impl Default for GradeLadder {
    fn default() -> Self {
        Self::setup()
    }
}

impl GradeLadder {
    /// Builds the ladder and links every tier to its neighbors.
    /// Calling it again yields an identical, independent ladder.
    pub fn setup() -> GradeLadder {
        let mut tiers = Vec::with_capacity(LADDER_SIZE);

        for grade in Grade::iter() {
            for level in 1..=LEVELS_PER_GRADE {
                let position = tiers.len();
                tiers.push(GradeTier {
                    grade,
                    level,
                    position,
                    previous: position.checked_sub(1),
                    next: None
                });
            }
        }

        let last = tiers.len() - 1;
        for tier in tiers.iter_mut().take(last) {
            tier.next = Some(tier.position + 1);
        }

        let codes = tiers.iter().map(|t| (t.code(), t.position)).collect();

        GradeLadder { tiers, codes }
    }

    /// All tiers in ladder order.
    pub fn all(&self) -> &[GradeTier] {
        &self.tiers
    }

    pub fn get(&self, position: usize) -> Option<&GradeTier> {
        self.tiers.get(position)
    }

    pub fn get_by_code(&self, code: &str) -> Option<&GradeTier> {
        self.codes.get(code).and_then(|p| self.tiers.get(*p))
    }

    pub fn get_by_grade_level(&self, grade: Grade, level: u8) -> Option<&GradeTier> {
        if level == 0 || level > LEVELS_PER_GRADE {
            return None;
        }

        self.tiers
            .get(grade.ordinal() * LEVELS_PER_GRADE as usize + (level as usize - 1))
    }

    /// Lookup by the stored string form of a grade, e.g. `("MEDIUM", 2)`.
    pub fn get_by_names(&self, grade: &str, level: i32) -> Option<&GradeTier> {
        let grade = Grade::from_str(grade).ok()?;
        let level = u8::try_from(level).ok()?;

        self.get_by_grade_level(grade, level)
    }

    /// Parses and resolves a tier code. Unlike [`GradeLadder::get_by_code`] this tells
    /// a malformed code apart from a well-formed one that is not on the ladder.
    pub fn parse(&self, code: &str) -> Result<&GradeTier, GradingError> {
        let (grade, level) = parse_code(code)?;

        self.get_by_grade_level(grade, level)
            .ok_or_else(|| GradingError::UnknownTier {
                grade: grade.to_string(),
                level: level as i32
            })
    }

    pub fn next(&self, tier: &GradeTier) -> Option<&GradeTier> {
        tier.next.and_then(|p| self.tiers.get(p))
    }

    pub fn previous(&self, tier: &GradeTier) -> Option<&GradeTier> {
        tier.previous.and_then(|p| self.tiers.get(p))
    }

    pub fn first(&self) -> &GradeTier {
        &self.tiers[0]
    }

    pub fn last(&self) -> &GradeTier {
        &self.tiers[self.tiers.len() - 1]
    }

    /// Starting tier for a new player: level 2 of the declared grade, `L:2` when none is declared.
    pub fn default_tier(&self, grade: Option<Grade>) -> &GradeTier {
        let position = grade.unwrap_or(Grade::Light).ordinal() * LEVELS_PER_GRADE as usize + (DEFAULT_LEVEL as usize - 1);
        &self.tiers[position]
    }
}
