//! Typed topsApp configuration and its XML rendering.
//!
//! The processor reads a `topsApp.xml` made of nested `component` and
//! `property` elements. The schema below names every supported property so a
//! configuration is validated before anything is written.

use crate::types::{ArchiveError, ArchiveResult, Snwe};
use quick_xml::escape::partial_escape;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const TOPSAPP_FILE: &str = "topsApp.xml";

/// Per-date input block (`master` or `slave` component)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneComponent {
    /// SLC archives for this date, in along-track order
    pub safe: Vec<String>,
    pub output_directory: String,
    pub orbit_directory: String,
    pub auxiliary_data_directory: String,
    #[serde(default)]
    pub region_of_interest: Option<Snwe>,
    #[serde(default)]
    pub polarization: Option<String>,
}

/// Optional processing knobs, usually read from a TOML template
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingOptions {
    pub azimuth_looks: Option<u32>,
    pub range_looks: Option<u32>,
    pub filter_strength: Option<f64>,
    pub swaths: Option<Vec<u8>>,
    pub polarization: Option<String>,
    pub do_unwrap: Option<bool>,
    pub unwrapper_name: Option<String>,
}

impl ProcessingOptions {
    pub fn from_toml(text: &str) -> ArchiveResult<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> ArchiveResult<Self> {
        log::info!("Loading topsApp template: {}", path.as_ref().display());
        Self::from_toml(&std::fs::read_to_string(path)?)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopsAppConfig {
    pub sensor_name: String,
    pub do_unwrap: bool,
    pub unwrapper_name: String,
    pub swaths: Vec<u8>,
    pub azimuth_looks: Option<u32>,
    pub range_looks: Option<u32>,
    pub filter_strength: Option<f64>,
    pub geocode_bounding_box: Option<Snwe>,
    pub dem_filename: Option<String>,
    pub master: SceneComponent,
    pub slave: SceneComponent,
}

/// A property value rendered the way the processor parses it
enum PropertyValue<'a> {
    Text(&'a str),
    Bool(bool),
    Number(String),
    TextList(&'a [String]),
    Box(&'a Snwe),
    Swaths(&'a [u8]),
}

impl PropertyValue<'_> {
    fn render(&self) -> String {
        match self {
            PropertyValue::Text(s) => s.to_string(),
            PropertyValue::Bool(true) => "True".to_string(),
            PropertyValue::Bool(false) => "False".to_string(),
            PropertyValue::Number(n) => n.clone(),
            PropertyValue::TextList(items) => {
                let quoted: Vec<String> = items.iter().map(|s| format!("'{}'", s)).collect();
                format!("[{}]", quoted.join(", "))
            }
            PropertyValue::Box(snwe) => {
                let [s, n, w, e] = snwe.as_array();
                format!("[{}, {}, {}, {}]", s, n, w, e)
            }
            PropertyValue::Swaths(swaths) => {
                let items: Vec<String> = swaths.iter().map(|s| s.to_string()).collect();
                format!("[{}]", items.join(", "))
            }
        }
    }
}

impl TopsAppConfig {
    /// Sentinel-1 defaults: all three swaths, unwrapping with snaphu_mcf
    pub fn new(master: SceneComponent, slave: SceneComponent) -> Self {
        Self {
            sensor_name: "SENTINEL1".to_string(),
            do_unwrap: true,
            unwrapper_name: "snaphu_mcf".to_string(),
            swaths: vec![1, 2, 3],
            azimuth_looks: None,
            range_looks: None,
            filter_strength: None,
            geocode_bounding_box: None,
            dem_filename: None,
            master,
            slave,
        }
    }

    /// Defaults overlaid with the knobs of a TOML template
    pub fn from_template(template: &str, master: SceneComponent, slave: SceneComponent) -> ArchiveResult<Self> {
        let options = ProcessingOptions::from_toml(template)?;
        Ok(Self::new(master, slave).with_options(&options))
    }

    /// Overlay template options on this configuration
    pub fn with_options(mut self, options: &ProcessingOptions) -> Self {
        if let Some(looks) = options.azimuth_looks {
            self.azimuth_looks = Some(looks);
        }
        if let Some(looks) = options.range_looks {
            self.range_looks = Some(looks);
        }
        if let Some(strength) = options.filter_strength {
            self.filter_strength = Some(strength);
        }
        if let Some(swaths) = &options.swaths {
            self.swaths = swaths.clone();
        }
        if let Some(unwrap) = options.do_unwrap {
            self.do_unwrap = unwrap;
        }
        if let Some(name) = &options.unwrapper_name {
            self.unwrapper_name = name.clone();
        }
        if let Some(pol) = &options.polarization {
            self.master.polarization = Some(pol.clone());
            self.slave.polarization = Some(pol.clone());
        }
        self
    }

    pub fn validate(&self) -> ArchiveResult<()> {
        if self.swaths.is_empty() {
            return Err(ArchiveError::Config("At least one swath is required".to_string()));
        }
        let mut seen = [false; 4];
        for &swath in &self.swaths {
            if !(1..=3).contains(&swath) {
                return Err(ArchiveError::Config(format!("Invalid swath number {}, expected 1-3", swath)));
            }
            if std::mem::replace(&mut seen[swath as usize], true) {
                return Err(ArchiveError::Config(format!("Swath {} listed twice", swath)));
            }
        }
        if let Some(strength) = self.filter_strength {
            if !(0.0..=1.0).contains(&strength) {
                return Err(ArchiveError::Config(format!("filter strength {} outside [0, 1]", strength)));
            }
        }
        if self.azimuth_looks == Some(0) || self.range_looks == Some(0) {
            return Err(ArchiveError::Config("Number of looks must be positive".to_string()));
        }
        if let Some(gbox) = &self.geocode_bounding_box {
            Snwe::new(gbox.south, gbox.north, gbox.west, gbox.east)?;
        }
        for (label, component) in [("master", &self.master), ("slave", &self.slave)] {
            if component.safe.is_empty() {
                return Err(ArchiveError::Config(format!("{} has no SLC scenes", label)));
            }
            if let Some(roi) = &component.region_of_interest {
                Snwe::new(roi.south, roi.north, roi.west, roi.east)?;
            }
        }
        Ok(())
    }

    fn component_properties(component: &SceneComponent) -> Vec<(&'static str, PropertyValue<'_>)> {
        let mut properties = vec![
            ("safe", PropertyValue::TextList(&component.safe)),
            ("output directory", PropertyValue::Text(&component.output_directory)),
            ("orbit directory", PropertyValue::Text(&component.orbit_directory)),
            ("auxiliary data directory", PropertyValue::Text(&component.auxiliary_data_directory)),
        ];
        if let Some(roi) = &component.region_of_interest {
            properties.push(("region of interest", PropertyValue::Box(roi)));
        }
        if let Some(pol) = &component.polarization {
            properties.push(("polarization", PropertyValue::Text(pol)));
        }
        properties
    }

    fn top_properties(&self) -> Vec<(&'static str, PropertyValue<'_>)> {
        let mut properties = vec![
            ("sensor name", PropertyValue::Text(&self.sensor_name)),
            ("do unwrap", PropertyValue::Bool(self.do_unwrap)),
            ("unwrapper name", PropertyValue::Text(&self.unwrapper_name)),
            ("swaths", PropertyValue::Swaths(&self.swaths)),
        ];
        if let Some(looks) = self.azimuth_looks {
            properties.push(("azimuthlooks", PropertyValue::Number(looks.to_string())));
        }
        if let Some(looks) = self.range_looks {
            properties.push(("rangelooks", PropertyValue::Number(looks.to_string())));
        }
        if let Some(strength) = self.filter_strength {
            properties.push(("filterstrength", PropertyValue::Number(strength.to_string())));
        }
        if let Some(gbox) = &self.geocode_bounding_box {
            properties.push(("geocode bounding box", PropertyValue::Box(gbox)));
        }
        if let Some(dem) = &self.dem_filename {
            properties.push(("demfilename", PropertyValue::Text(dem)));
        }
        properties
    }

    /// Render `<topsApp><component name="topsinsar">...</component></topsApp>`
    pub fn to_xml(&self) -> ArchiveResult<String> {
        self.validate()?;

        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 4);
        write_event(&mut writer, Event::Start(BytesStart::new("topsApp")))?;
        write_event(&mut writer, component_start("topsinsar"))?;

        for (name, value) in self.top_properties() {
            write_property(&mut writer, name, &value)?;
        }
        for (label, component) in [("master", &self.master), ("slave", &self.slave)] {
            write_event(&mut writer, component_start(label))?;
            for (name, value) in Self::component_properties(component) {
                write_property(&mut writer, name, &value)?;
            }
            write_event(&mut writer, Event::End(BytesEnd::new("component")))?;
        }

        write_event(&mut writer, Event::End(BytesEnd::new("component")))?;
        write_event(&mut writer, Event::End(BytesEnd::new("topsApp")))?;

        let mut xml = String::from_utf8(writer.into_inner())
            .map_err(|e| ArchiveError::Xml(format!("Non UTF-8 output: {}", e)))?;
        xml.push('\n');
        Ok(xml)
    }

    /// Write the XML document, replacing any existing file
    pub fn write_xml<P: AsRef<Path>>(&self, path: P) -> ArchiveResult<()> {
        let xml = self.to_xml()?;
        std::fs::write(&path, xml)?;
        log::info!("Wrote {}", path.as_ref().display());
        Ok(())
    }
}

fn component_start(name: &str) -> Event<'_> {
    Event::Start(BytesStart::new("component").with_attributes([("name", name)]))
}

fn write_event(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> ArchiveResult<()> {
    writer
        .write_event(event)
        .map_err(|e| ArchiveError::Xml(e.to_string()))
}

fn write_property(writer: &mut Writer<Vec<u8>>, name: &str, value: &PropertyValue<'_>) -> ArchiveResult<()> {
    let rendered = value.render();
    write_event(writer, Event::Start(BytesStart::new("property").with_attributes([("name", name)])))?;
    // quotes stay literal, the processor evaluates list values as Python
    write_event(writer, Event::Text(BytesText::from_escaped(partial_escape(&rendered))))?;
    write_event(writer, Event::End(BytesEnd::new("property")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn component(safe: &str, dir: &str) -> SceneComponent {
        SceneComponent {
            safe: vec![safe.to_string()],
            output_directory: dir.to_string(),
            orbit_directory: "/data/orbits".to_string(),
            auxiliary_data_directory: "/data/aux".to_string(),
            region_of_interest: None,
            polarization: None,
        }
    }

    #[test]
    fn test_xml_structure() {
        let mut config = TopsAppConfig::new(component("s1a.zip", "masterdir"), component("s1b.zip", "slavedir"));
        config.azimuth_looks = Some(7);
        config.filter_strength = Some(0.5);

        let xml = config.to_xml().unwrap();
        assert!(xml.starts_with("<topsApp>"));
        assert!(xml.contains(r#"<component name="topsinsar">"#));
        assert!(xml.contains(r#"<property name="azimuthlooks">7</property>"#));
        assert!(xml.contains(r#"<property name="filterstrength">0.5</property>"#));
        assert!(xml.contains(r#"<property name="do unwrap">True</property>"#));
        assert!(xml.contains(r#"<property name="swaths">[1, 2, 3]</property>"#));
        assert!(xml.contains(r#"<property name="safe">['s1a.zip']</property>"#));
        assert!(xml.trim_end().ends_with("</topsApp>"));
    }

    #[test]
    fn test_validation() {
        let mut config = TopsAppConfig::new(component("a.zip", "m"), component("b.zip", "s"));
        config.swaths = vec![1, 4];
        assert!(config.validate().is_err());

        config.swaths = vec![2, 2];
        assert!(config.validate().is_err());

        config.swaths = vec![2];
        config.slave.safe.clear();
        assert!(matches!(config.to_xml(), Err(ArchiveError::Config(_))));
    }

    #[test]
    fn test_template_options() {
        let options = ProcessingOptions::from_toml(
            r#"
            azimuth_looks = 1
            range_looks = 7
            polarization = "vv"
            swaths = [1, 2]
            "#,
        )
        .unwrap();
        let config = TopsAppConfig::new(component("a.zip", "m"), component("b.zip", "s")).with_options(&options);

        assert_eq!(config.azimuth_looks, Some(1));
        assert_eq!(config.swaths, vec![1, 2]);
        assert_eq!(config.master.polarization.as_deref(), Some("vv"));
        assert!(config.do_unwrap);
    }
}
