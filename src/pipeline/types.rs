//! Types step: which product types and vendors the grouped folders cover.

use super::{dir_name, list_subdirs, require_file, StepError};
use crate::config::{PipelineConfig, TypeDefinition};
use std::collections::BTreeSet;

/// Present codes per type and vendor, plus folders no type claims.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TypeSummary {
    /// (type name, [(vendor, present codes)]) in type-map order
    pub matched: Vec<(String, Vec<(String, Vec<String>)>)>,
    pub others: Vec<String>,
}

/// Match uppercased folder codes against the type map.
pub fn summarize_types(folders: &BTreeSet<String>, type_map: &[TypeDefinition]) -> TypeSummary {
    let mut defined = BTreeSet::new();
    let mut matched = Vec::new();

    for def in type_map {
        let mut vendors = Vec::new();
        for vc in &def.vendors {
            defined.extend(vc.codes.iter().map(|c| c.to_uppercase()));
            let present: Vec<String> = vc
                .codes
                .iter()
                .filter(|c| folders.contains(&c.to_uppercase()))
                .cloned()
                .collect();
            if !present.is_empty() {
                vendors.push((vc.vendor.clone(), present));
            }
        }
        if !vendors.is_empty() {
            matched.push((def.name.clone(), vendors));
        }
    }

    TypeSummary {
        matched,
        others: folders.difference(&defined).cloned().collect(),
    }
}

pub(super) fn run(cfg: &PipelineConfig) -> Result<(), StepError> {
    let base = &cfg.out_grouped_by_col4;
    require_file(base)?;

    let folders: BTreeSet<String> = list_subdirs(base, |name| {
        let name = name.trim();
        !name.is_empty() && !name.starts_with("~$") && !name.starts_with('.')
    })?
    .iter()
    .map(|p| dir_name(p).trim().to_uppercase())
    .collect();

    if folders.is_empty() {
        tracing::info!("Folder codes present: (none)");
    } else {
        let codes: Vec<&str> = folders.iter().map(String::as_str).collect();
        tracing::info!("Folder codes present: {}", codes.join(", "));
    }

    let summary = summarize_types(&folders, &cfg.type_map);
    for (type_name, vendors) in &summary.matched {
        let parts: Vec<String> = vendors
            .iter()
            .map(|(vendor, codes)| format!("{}={}", vendor, codes.join(", ")))
            .collect();
        tracing::info!("Type {}: {} present", type_name, parts.join(" / "));
    }
    if !summary.others.is_empty() {
        tracing::info!("Others: {}", summary.others.join(", "));
    }
    if summary.matched.is_empty() && summary.others.is_empty() {
        tracing::info!("No known type codes present yet");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_type_map;

    fn folders(codes: &[&str]) -> BTreeSet<String> {
        codes.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn known_codes_are_grouped_by_type_and_vendor() {
        let summary = summarize_types(&folders(&["W00", "L0M", "20M", "XYZ"]), &default_type_map());
        assert_eq!(summary.matched.len(), 2);

        let (name, vendors) = &summary.matched[0];
        assert_eq!(name, "LWPF(90)");
        assert_eq!(
            vendors,
            &vec![
                ("SEC".to_string(), vec!["W00".to_string()]),
                ("Sumitomo".to_string(), vec!["20M".to_string()]),
            ]
        );
        assert_eq!(summary.matched[1].0, "LWPF(150)");
        assert_eq!(summary.others, ["XYZ"]);
    }

    #[test]
    fn nothing_present() {
        assert_eq!(
            summarize_types(&BTreeSet::new(), &default_type_map()),
            TypeSummary::default()
        );
    }
}
