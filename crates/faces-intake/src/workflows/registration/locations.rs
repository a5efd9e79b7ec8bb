use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::domain::LocationSelection;

/// Hierarchical location reference data used to check address selections.
///
/// An empty catalog places no constraints on the selection. A district with no
/// area list accepts any non-empty area.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationCatalog {
    governorates: Vec<GovernorateEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GovernorateEntry {
    pub name: String,
    pub districts: Vec<DistrictEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistrictEntry {
    pub name: String,
    #[serde(default)]
    pub areas: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum LocationMismatch {
    #[error("Please select a valid governorate")]
    UnknownGovernorate,
    #[error("District does not belong to the selected governorate")]
    DistrictOutsideGovernorate,
    #[error("Area does not belong to the selected district")]
    AreaOutsideDistrict,
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to read location catalog: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid location catalog: {0}")]
    Parse(#[from] serde_json::Error),
}

impl LocationCatalog {
    pub fn new(governorates: Vec<GovernorateEntry>) -> Self {
        Self { governorates }
    }

    /// Catalog accepting any selection.
    pub fn unrestricted() -> Self {
        Self::default()
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, CatalogError> {
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(std::io::BufReader::new(file))
    }

    pub fn is_unrestricted(&self) -> bool {
        self.governorates.is_empty()
    }

    pub fn governorates(&self) -> Vec<&str> {
        self.governorates
            .iter()
            .map(|entry| entry.name.as_str())
            .collect()
    }

    pub fn districts(&self, governorate: &str) -> Vec<&str> {
        self.governorate(governorate)
            .map(|entry| {
                entry
                    .districts
                    .iter()
                    .map(|district| district.name.as_str())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn areas(&self, governorate: &str, district: &str) -> Vec<&str> {
        self.district(governorate, district)
            .map(|entry| entry.areas.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Checks each selected level against its parent.
    pub fn check(&self, selection: &LocationSelection) -> Result<(), LocationMismatch> {
        if self.is_unrestricted() {
            return Ok(());
        }

        let governorate = self
            .governorate(selection.governorate().trim())
            .ok_or(LocationMismatch::UnknownGovernorate)?;

        let district = governorate
            .districts
            .iter()
            .find(|entry| entry.name == selection.district().trim())
            .ok_or(LocationMismatch::DistrictOutsideGovernorate)?;

        let area = selection.area().trim();
        if !district.areas.is_empty() && !district.areas.iter().any(|entry| entry == area) {
            return Err(LocationMismatch::AreaOutsideDistrict);
        }

        Ok(())
    }

    fn governorate(&self, name: &str) -> Option<&GovernorateEntry> {
        self.governorates.iter().find(|entry| entry.name == name)
    }

    fn district(&self, governorate: &str, district: &str) -> Option<&DistrictEntry> {
        self.governorate(governorate)
            .and_then(|entry| entry.districts.iter().find(|d| d.name == district))
    }

    /// Lebanese governorates and districts, with area lists for the districts the
    /// agency recruits from most.
    pub fn lebanon() -> Self {
        let governorate = |name: &str, districts: Vec<DistrictEntry>| GovernorateEntry {
            name: name.to_string(),
            districts,
        };
        let district = |name: &str, areas: &[&str]| DistrictEntry {
            name: name.to_string(),
            areas: areas.iter().map(|area| area.to_string()).collect(),
        };

        Self::new(vec![
            governorate(
                "Beirut",
                vec![district(
                    "Beirut",
                    &[
                        "Achrafieh", "Ain El Mreisseh", "Badaro", "Bachoura", "Basta",
                        "Bourj Hammoud", "Clemenceau", "Corniche El Mazraa", "Downtown",
                        "Furn El Chebbak", "Geitawi", "Gemmayzeh", "Hamra", "Karantina",
                        "Koraytem", "Mar Elias", "Mar Mikhael", "Mazraa", "Monot", "Qantari",
                        "Ras Beirut", "Rmeil", "Saifi", "Sanayeh", "Sodeco", "Tariq El Jdideh",
                        "Verdun", "Zuqaq al-Blat",
                    ],
                )],
            ),
            governorate(
                "Mount Lebanon",
                vec![
                    district(
                        "Aley",
                        &[
                            "Aaley", "Abadieh", "Aramoun", "Bchamoun", "Bhamdoun", "Chouweifat",
                            "Kahale", "Kfarmatta", "Souk El Gharb", "Wadi Chahrour",
                        ],
                    ),
                    district(
                        "Baabda",
                        &[
                            "Baabda", "Baabdat", "Chiyah", "Furn El Chebbak", "Ghoubeyri",
                            "Hadath", "Haret Hreik", "Hazmieh", "Yarze",
                        ],
                    ),
                    district(
                        "Byblos",
                        &[
                            "Amchit", "Byblos (Jbeil)", "Blat", "Fidar", "Hboub", "Kfar Mashoun",
                            "Mastita",
                        ],
                    ),
                    district(
                        "Chouf",
                        &[
                            "Damour", "Deir El Qamar", "Joun", "Kfar Nabrakh", "Moukhtara",
                            "Naameh", "Roum",
                        ],
                    ),
                    district(
                        "Keserwan",
                        &[
                            "Adma", "Ajaltoun", "Ballouneh", "Faraya", "Feytroun", "Ghazir",
                            "Ghosta", "Harissa", "Jeita", "Jounieh", "Kfardebian", "Mayrouba",
                            "Rayfoun", "Sarba", "Tabarja", "Zouk Mikael", "Zouk Mosbeh",
                        ],
                    ),
                    district(
                        "Matn",
                        &[
                            "Ain Aar", "Ain Saadeh", "Antelias", "Beit Chabab", "Beit Mery",
                            "Bikfaya", "Broummana", "Dbayeh", "Dekwaneh", "Dora", "Fanar",
                            "Jal El Dib", "Jdeideh", "Mansourieh", "Sidn El Fil (Sin El Fil)", "Zalka",
                        ],
                    ),
                ],
            ),
            governorate(
                "North Lebanon",
                vec![
                    district(
                        "Batroun",
                        &[
                            "Anfeh", "Batroun", "Chekka", "Douma", "Kfour El Arabi", "Selaata",
                            "Tannourine",
                        ],
                    ),
                    district("Bsharri", &[]),
                    district("Koura", &[]),
                    district("Miniyeh-Danniyeh", &[]),
                    district("Tripoli", &["Mina (Port of Tripoli)", "Tripoli (Trablos)"]),
                    district("Zgharta", &["Ehden", "Tourza", "Zgharta"]),
                ],
            ),
            governorate(
                "South Lebanon",
                vec![
                    district("Jezzine", &[]),
                    district(
                        "Sidon",
                        &[
                            "Abra", "Ain El Delb", "Bramieh", "Ghaziyeh", "Maghdouche",
                            "Saida (Sidon)", "Sarafand", "Zahrani",
                        ],
                    ),
                ],
            ),
            governorate(
                "Bekaa",
                vec![
                    district("Rashaya", &[]),
                    district("Western Bekaa", &[]),
                    district(
                        "Zahle",
                        &[
                            "Aanjar", "Ablah", "Bar Elias", "Chtaura", "Ferzol", "Kab Elias",
                            "Majdal Aanjar", "Rayak", "Saadnayel", "Taanayel", "Terbol", "Zahle",
                        ],
                    ),
                ],
            ),
            governorate(
                "Nabatieh",
                vec![
                    district("Bint Jbeil", &["Aytaroun", "Bint Jbeil", "Rmeish", "Tebnine"]),
                    district("Hasbaya", &[]),
                    district("Marjeyoun", &[]),
                    district("Nabatieh", &[]),
                ],
            ),
            governorate("Akkar", vec![district("Akkar", &[])]),
            governorate(
                "Baalbek-Hermel",
                vec![district("Baalbek", &[]), district("Hermel", &[])],
            ),
        ])
    }
}
