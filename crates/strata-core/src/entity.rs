//! Record types for every table the catalogue reads.
//!
//! Each type carries its table name, its projection, and a [`FromRow`]
//! decoder. Types that own media implement [`MediaOwner`] with the join-key
//! rule for their association.

use serde::{Deserialize, Serialize};

use crate::{
  Result,
  media::{Association, MediaOwner},
  query::{Column, FilterSpec},
  value::{FromRow, Row},
};

// ─── SpatialModel ────────────────────────────────────────────────────────────

/// A 3D terrain model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpatialModel {
  pub id:              i64,
  pub geographic_name: Option<String>,
  pub description:     Option<String>,
  pub coord_x:         Option<f64>,
  pub coord_y:         Option<f64>,
  pub basin:           Option<String>,
  pub orientation:     Option<String>,
  pub url:             Option<String>,
}

impl SpatialModel {
  pub const TABLE: &'static str = "spatial_models";
  pub const PROJECTION: &'static [Column] = &[
    Column::new("id"),
    Column::new("geographic_name"),
    Column::new("description"),
    Column::new("coord_x"),
    Column::new("coord_y"),
    Column::new("basin"),
    Column::new("orientation"),
    Column::new("url"),
  ];
}

impl FromRow for SpatialModel {
  fn from_row(row: Row) -> Result<Self> {
    Ok(Self {
      id:              row.i64("id")?,
      geographic_name: row.opt_text("geographic_name")?,
      description:     row.opt_text("description")?,
      coord_x:         row.opt_f64("coord_x")?,
      coord_y:         row.opt_f64("coord_y")?,
      basin:           row.opt_text("basin")?,
      orientation:     row.opt_text("orientation")?,
      url:             row.opt_text("url")?,
    })
  }
}

impl MediaOwner for SpatialModel {
  // Joined on the geographic name; two models sharing a name share media.
  fn association(&self) -> Option<Association> {
    self
      .geographic_name
      .clone()
      .filter(|n| !n.is_empty())
      .map(Association::SpatialModel)
  }
}

// ─── RockSample ──────────────────────────────────────────────────────────────

/// A field rock sample, keyed by its human-readable code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RockSample {
  pub code:        String,
  pub name:        Option<String>,
  pub basin:       Option<String>,
  pub source:      Option<String>,
  pub stratum:     Option<String>,
  pub lithology:   Option<String>,
  pub description: Option<String>,
  pub location:    Option<String>,
  pub sampled_at:  Option<String>,
}

impl RockSample {
  pub const TABLE: &'static str = "rock_samples";
  pub const PROJECTION: &'static [Column] = &[
    Column::new("code"),
    Column::new("name"),
    Column::new("basin"),
    Column::new("source"),
    Column::new("stratum"),
    Column::new("lithology"),
    Column::new("description"),
    Column::new("location"),
    Column::new("sampled_at"),
  ];
}

impl FromRow for RockSample {
  fn from_row(row: Row) -> Result<Self> {
    Ok(Self {
      code:        row.text("code")?,
      name:        row.opt_text("name")?,
      basin:       row.opt_text("basin")?,
      source:      row.opt_text("source")?,
      stratum:     row.opt_text("stratum")?,
      lithology:   row.opt_text("lithology")?,
      description: row.opt_text("description")?,
      location:    row.opt_text("location")?,
      sampled_at:  row.opt_text("sampled_at")?,
    })
  }
}

impl MediaOwner for RockSample {
  fn association(&self) -> Option<Association> {
    Some(Association::RockSample(self.code.clone()))
  }
}

// ─── ThinSectionReport ───────────────────────────────────────────────────────

/// Petrographic thin-section identification, one per rock sample code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThinSectionReport {
  pub code:              String,
  pub rock_class:        Option<String>,
  pub composition:       Option<String>,
  pub grain_size:        Option<String>,
  pub special_substance: Option<String>,
  pub special_structure: Option<String>,
  pub color:             Option<String>,
  pub photo:             Option<String>,
  pub roundness:         Option<String>,
  pub porosity:          Option<String>,
  pub sorting:           Option<String>,
  pub matrix:            Option<String>,
  pub fragment_content:  Option<String>,
  pub feldspar_content:  Option<String>,
  pub quartz_content:    Option<String>,
}

impl ThinSectionReport {
  pub const TABLE: &'static str = "thin_section_reports";
  pub const PROJECTION: &'static [Column] = &[
    Column::new("code"),
    Column::new("rock_class"),
    Column::new("composition"),
    Column::new("grain_size"),
    Column::new("special_substance"),
    Column::new("special_structure"),
    Column::new("color"),
    Column::new("photo"),
    Column::new("roundness"),
    Column::new("porosity"),
    Column::new("sorting"),
    Column::new("matrix"),
    Column::new("fragment_content"),
    Column::new("feldspar_content"),
    Column::new("quartz_content"),
  ];
}

impl FromRow for ThinSectionReport {
  fn from_row(row: Row) -> Result<Self> {
    Ok(Self {
      code:              row.text("code")?,
      rock_class:        row.opt_text("rock_class")?,
      composition:       row.opt_text("composition")?,
      grain_size:        row.opt_text("grain_size")?,
      special_substance: row.opt_text("special_substance")?,
      special_structure: row.opt_text("special_structure")?,
      color:             row.opt_text("color")?,
      photo:             row.opt_text("photo")?,
      roundness:         row.opt_text("roundness")?,
      porosity:          row.opt_text("porosity")?,
      sorting:           row.opt_text("sorting")?,
      matrix:            row.opt_text("matrix")?,
      fragment_content:  row.opt_text("fragment_content")?,
      feldspar_content:  row.opt_text("feldspar_content")?,
      quartz_content:    row.opt_text("quartz_content")?,
    })
  }
}

impl MediaOwner for ThinSectionReport {
  fn association(&self) -> Option<Association> {
    Some(Association::ThinSectionReport(self.code.clone()))
  }
}

// ─── XrfResult ───────────────────────────────────────────────────────────────

/// X-ray fluorescence element concentrations for one sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct XrfResult {
  pub code:       String,
  pub stratum:    Option<String>,
  pub field_name: Option<String>,
  pub si:         Option<f64>,
  pub mg:         Option<f64>,
  pub al:         Option<f64>,
  pub k:          Option<f64>,
  pub ca:         Option<f64>,
  pub fe:         Option<f64>,
  pub ba:         Option<f64>,
}

impl XrfResult {
  pub const TABLE: &'static str = "xrf_results";
  /// Codes in this table may carry stray per-character spacing.
  pub const KEY: &'static str = "code";
  pub const PROJECTION: &'static [Column] = &[
    Column::new("code"),
    Column::new("stratum"),
    Column::new("field_name"),
    Column::new("si"),
    Column::new("mg"),
    Column::new("al"),
    Column::new("k"),
    Column::new("ca"),
    Column::new("fe"),
    Column::new("ba"),
  ];
}

impl FromRow for XrfResult {
  fn from_row(row: Row) -> Result<Self> {
    Ok(Self {
      code:       row.text("code")?,
      stratum:    row.opt_text("stratum")?,
      field_name: row.opt_text("field_name")?,
      si:         row.opt_f64("si")?,
      mg:         row.opt_f64("mg")?,
      al:         row.opt_f64("al")?,
      k:          row.opt_f64("k")?,
      ca:         row.opt_f64("ca")?,
      fe:         row.opt_f64("fe")?,
      ba:         row.opt_f64("ba")?,
    })
  }
}

// ─── RockSpecimen ────────────────────────────────────────────────────────────

/// A catalogued hand specimen; the filterable listing table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RockSpecimen {
  pub id:                i64,
  pub series:            Option<String>,
  pub group_section:     Option<String>,
  pub base_name:         Option<String>,
  pub color:             Option<String>,
  pub main_composition:  Option<String>,
  pub grain_size:        Option<String>,
  pub special_structure: Option<String>,
  pub special_mineral:   Option<String>,
  pub rock_category:     Option<String>,
}

impl RockSpecimen {
  pub const TABLE: &'static str = "rock_specimens";
  pub const PROJECTION: &'static [Column] = &[
    Column::new("id"),
    Column::new("series"),
    Column::new("group_section"),
    Column::new("base_name"),
    Column::new("color"),
    Column::new("main_composition"),
    Column::new("grain_size"),
    Column::new("special_structure"),
    Column::new("special_mineral"),
    Column::new("rock_category"),
  ];

  /// Every filter the listing endpoint recognises, in clause order.
  pub const FILTERS: &'static [FilterSpec] = &[
    FilterSpec::contains("name", "base_name"),
    FilterSpec::exact("category", "rock_category"),
    FilterSpec::exact("color", "color"),
    FilterSpec::contains("composition", "main_composition"),
    FilterSpec::exact("grain_size", "grain_size"),
    FilterSpec::contains("structure", "special_structure"),
    FilterSpec::contains("mineral", "special_mineral"),
    FilterSpec::exact("series", "series"),
    FilterSpec::exact("group", "group_section"),
  ];

  /// `(filter name, column)` pairs whose distinct values make up the filter
  /// catalogue.
  pub const CATALOG_COLUMNS: &'static [(&'static str, &'static str)] = &[
    ("category", "rock_category"),
    ("color", "color"),
    ("grain_size", "grain_size"),
    ("structure", "special_structure"),
    ("mineral", "special_mineral"),
  ];
}

impl FromRow for RockSpecimen {
  fn from_row(row: Row) -> Result<Self> {
    Ok(Self {
      id:                row.i64("id")?,
      series:            row.opt_text("series")?,
      group_section:     row.opt_text("group_section")?,
      base_name:         row.opt_text("base_name")?,
      color:             row.opt_text("color")?,
      main_composition:  row.opt_text("main_composition")?,
      grain_size:        row.opt_text("grain_size")?,
      special_structure: row.opt_text("special_structure")?,
      special_mineral:   row.opt_text("special_mineral")?,
      rock_category:     row.opt_text("rock_category")?,
    })
  }
}

impl MediaOwner for RockSpecimen {
  fn association(&self) -> Option<Association> {
    Some(Association::RockSpecimen(self.id))
  }
}

// ─── Relation ────────────────────────────────────────────────────────────────

/// A symmetric link between two sample codes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relation {
  pub id:            i64,
  pub relation_type: Option<String>,
  pub entity_ref_1:  Option<String>,
  pub entity_ref_2:  Option<String>,
  pub degree:        Option<f64>,
  pub file:          Option<String>,
  /// Name of the rock sample behind `entity_ref_1`, if any.
  pub entity_1_name: Option<String>,
  pub entity_2_name: Option<String>,
}

impl Relation {
  /// Binds the entity reference twice, once per side. Ties on degree fall
  /// back to id so the order is stable.
  pub const SYMMETRIC_SQL: &'static str = "SELECT
       r.id, r.relation_type, r.entity_ref_1, r.entity_ref_2, r.degree, r.file,
       s1.name AS entity_1_name,
       s2.name AS entity_2_name
     FROM relations r
     LEFT JOIN rock_samples s1 ON r.entity_ref_1 = s1.code
     LEFT JOIN rock_samples s2 ON r.entity_ref_2 = s2.code
     WHERE r.entity_ref_1 = ? OR r.entity_ref_2 = ?
     ORDER BY r.degree DESC, r.id ASC";
}

impl FromRow for Relation {
  fn from_row(row: Row) -> Result<Self> {
    Ok(Self {
      id:            row.i64("id")?,
      relation_type: row.opt_text("relation_type")?,
      entity_ref_1:  row.opt_text("entity_ref_1")?,
      entity_ref_2:  row.opt_text("entity_ref_2")?,
      degree:        row.opt_f64("degree")?,
      file:          row.opt_text("file")?,
      entity_1_name: row.opt_text("entity_1_name")?,
      entity_2_name: row.opt_text("entity_2_name")?,
    })
  }
}
