use serde::{Deserialize, Serialize};

/// Screens of the registration wizard; the kind selects the validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    Welcome,
    Identity,
    Contact,
    Address,
    Languages,
    Appearance,
    Measurements,
    Talents,
    Availability,
    Photos,
    Review,
}

impl StepKind {
    pub const fn label(self) -> &'static str {
        match self {
            StepKind::Welcome => "Welcome",
            StepKind::Identity => "Main Information",
            StepKind::Contact => "Contact Information",
            StepKind::Address => "Address",
            StepKind::Languages => "Languages",
            StepKind::Appearance => "Appearance",
            StepKind::Measurements => "Measurements",
            StepKind::Talents => "Talents & Experience",
            StepKind::Availability => "Additional Information",
            StepKind::Photos => "Photos",
            StepKind::Review => "Review",
        }
    }

    /// Record fields a candidate must fill before leaving this step.
    pub const fn required_fields(self) -> &'static [&'static str] {
        match self {
            StepKind::Welcome => &["gender"],
            StepKind::Identity => &[
                "first_name",
                "middle_name",
                "last_name",
                "date_of_birth",
                "nationality",
            ],
            StepKind::Contact => &[
                "mobile",
                "whatsapp",
                "other_number",
                "other_number_relationship",
                "other_number_person_name",
            ],
            StepKind::Address => &["governorate", "district", "area"],
            StepKind::Languages => &["languages"],
            StepKind::Appearance => &[
                "eye_color",
                "hair_color",
                "hair_type",
                "hair_length",
                "skin_tone",
            ],
            StepKind::Measurements => &[
                "height",
                "weight",
                "pant_size",
                "jacket_size",
                "shoe_size",
                "waist",
                "bust",
                "hips",
                "shoulders",
            ],
            StepKind::Talents | StepKind::Availability | StepKind::Photos | StepKind::Review => {
                &[]
            }
        }
    }
}

/// Static description of one wizard position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StepDescriptor {
    pub position: usize,
    pub kind: StepKind,
    pub mandatory: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("a wizard needs at least one step")]
    Empty,
    #[error("step {0:?} appears more than once")]
    Duplicate(StepKind),
}

const STANDARD_LAYOUT: [(StepKind, bool); 11] = [
    (StepKind::Welcome, true),
    (StepKind::Identity, true),
    (StepKind::Contact, true),
    (StepKind::Address, true),
    (StepKind::Languages, true),
    (StepKind::Appearance, true),
    (StepKind::Measurements, true),
    (StepKind::Talents, false),
    (StepKind::Availability, false),
    (StepKind::Photos, false),
    (StepKind::Review, false),
];

fn describe(layout: &[(StepKind, bool)]) -> Vec<StepDescriptor> {
    layout
        .iter()
        .copied()
        .enumerate()
        .map(|(position, (kind, mandatory))| StepDescriptor {
            position,
            kind,
            mandatory,
        })
        .collect()
}

/// Ordered, read-only list of wizard steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepRegistry {
    steps: Vec<StepDescriptor>,
}

impl StepRegistry {
    /// The eleven-screen flow used by the public registration form.
    pub fn standard() -> Self {
        Self {
            steps: describe(&STANDARD_LAYOUT),
        }
    }

    pub fn from_layout(layout: &[(StepKind, bool)]) -> Result<Self, RegistryError> {
        if layout.is_empty() {
            return Err(RegistryError::Empty);
        }

        for (index, (kind, _)) in layout.iter().enumerate() {
            if layout[..index].iter().any(|(earlier, _)| earlier == kind) {
                return Err(RegistryError::Duplicate(*kind));
            }
        }

        Ok(Self {
            steps: describe(layout),
        })
    }

    pub fn get(&self, position: usize) -> Option<&StepDescriptor> {
        self.steps.get(position)
    }

    pub fn position_of(&self, kind: StepKind) -> Option<usize> {
        self.steps.iter().position(|step| step.kind == kind)
    }

    pub fn last_index(&self) -> usize {
        self.steps.len() - 1
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &StepDescriptor> {
        self.steps.iter()
    }
}
