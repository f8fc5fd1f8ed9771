//! Walks the node tree and pulls out the `keymap` and `combos` containers.

use std::collections::HashMap;

use keymap_parse::{Node, Property, Span, Token};
use tracing::{debug, warn};

use crate::binding::{BindingError, parse_bindings, parse_cells, parse_single_cell, parse_string};
use crate::diagnostic::{Diagnostic, DiagnosticKind, Subject};
use crate::error::StructureError;
use crate::model::{Combo, KeymapModel, Layer};

/// A successfully extracted keymap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parsed {
    /// Layers and combos, in source order.
    pub model: KeymapModel,
    /// Entries that were skipped or look suspicious, in source order.
    pub diagnostics: Vec<Diagnostic>,
}

impl Parsed {
    /// Whether extraction found nothing to complain about.
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Drop the diagnostics and keep the model.
    pub fn into_model(self) -> KeymapModel {
        self.model
    }
}

/// Build the keymap model from a parsed node tree.
///
/// `keymap` and `combos` nodes are looked for at any depth. Reference nodes
/// (`&mt { ... };`) and everything else are ignored. Fails only when neither
/// container exists; anomalies inside them become diagnostics.
pub fn extract(root: &Node<'_>) -> Result<Parsed, StructureError> {
    let mut extractor = Extractor::default();
    extractor.visit(root);

    if !extractor.found_container {
        return Err(StructureError { span: root.span });
    }

    debug!(
        layers = extractor.model.layers.len(),
        combos = extractor.model.combos.len(),
        diagnostics = extractor.diagnostics.len(),
        "extracted keymap"
    );
    Ok(Parsed {
        model: extractor.model,
        diagnostics: extractor.diagnostics,
    })
}

#[derive(Default)]
struct Extractor {
    model: KeymapModel,
    diagnostics: Vec<Diagnostic>,
    found_container: bool,
    layer_names: HashMap<String, Span>,
    combo_names: HashMap<String, Span>,
}

impl Extractor {
    fn visit(&mut self, node: &Node<'_>) {
        if node.reference {
            return;
        }

        match node.name {
            "keymap" => {
                self.found_container = true;
                for child in &node.children {
                    self.layer(child);
                }
            }
            "combos" => {
                self.found_container = true;
                for child in &node.children {
                    self.combo(child);
                }
            }
            _ => {
                for child in &node.children {
                    self.visit(child);
                }
            }
        }
    }

    fn layer(&mut self, node: &Node<'_>) {
        let subject = Subject::Layer(node.name.to_string());

        let Some(bindings) = self.required(node, &subject, "bindings") else {
            return;
        };
        let Some(bindings) = self.decode(&subject, bindings, true, parse_bindings) else {
            return;
        };

        let sensor_bindings = node
            .property("sensor-bindings")
            .and_then(|p| self.decode(&subject, p, false, parse_bindings))
            .unwrap_or_default();

        let display_name = node
            .property("display-name")
            .or_else(|| node.property("label"))
            .and_then(|p| self.decode(&subject, p, false, parse_string));

        self.check_duplicate(&subject, node.span);
        self.model.layers.push(Layer {
            name: node.name.to_string(),
            display_name,
            bindings,
            sensor_bindings,
        });
    }

    fn combo(&mut self, node: &Node<'_>) {
        let subject = Subject::Combo(node.name.to_string());

        let (Some(timeout), Some(positions), Some(bindings)) = (
            self.required(node, &subject, "timeout-ms"),
            self.required(node, &subject, "key-positions"),
            self.required(node, &subject, "bindings"),
        ) else {
            return;
        };

        let (Some(timeout_ms), Some(key_positions), Some(mut behaviors)) = (
            self.decode(&subject, timeout, true, parse_single_cell),
            self.decode(&subject, positions, true, parse_cells),
            self.decode(&subject, bindings, true, parse_bindings),
        ) else {
            return;
        };

        if behaviors.len() != 1 {
            self.report(Diagnostic {
                kind: DiagnosticKind::ComboBindingCount {
                    found: behaviors.len(),
                },
                subject,
                span: bindings.value_span(),
                skipped: true,
            });
            return;
        }

        let layers = node
            .property("layers")
            .and_then(|p| self.decode(&subject, p, false, parse_cells))
            .unwrap_or_default();

        self.check_duplicate(&subject, node.span);
        self.model.combos.push(Combo {
            name: node.name.to_string(),
            timeout_ms,
            key_positions,
            binding: behaviors.remove(0),
            layers,
        });
    }

    /// Look up a property the entry can't do without.
    fn required<'n, 'src>(
        &mut self,
        node: &'n Node<'src>,
        subject: &Subject,
        property: &'static str,
    ) -> Option<&'n Property<'src>> {
        let found = node.property(property);
        if found.is_none() {
            self.report(Diagnostic {
                kind: DiagnosticKind::MissingProperty { property },
                subject: subject.clone(),
                span: node.span,
                skipped: true,
            });
        }
        found
    }

    /// Decode a property value, reporting failures. `skips` says whether a
    /// failure drops the whole entry.
    fn decode<T>(
        &mut self,
        subject: &Subject,
        property: &Property<'_>,
        skips: bool,
        decoder: impl FnOnce(&[Token<'_>]) -> Result<T, BindingError>,
    ) -> Option<T> {
        match decoder(&property.value) {
            Ok(value) => Some(value),
            Err(error) => {
                let span = if property.is_flag() {
                    property.span
                } else {
                    error.span
                };
                self.report(Diagnostic {
                    kind: DiagnosticKind::InvalidProperty {
                        property: property.name.to_string(),
                        error,
                    },
                    subject: subject.clone(),
                    span,
                    skipped: skips,
                });
                None
            }
        }
    }

    /// Names are kept even when repeated, but the repeat is reported.
    fn check_duplicate(&mut self, subject: &Subject, span: Span) {
        let (names, name) = match subject {
            Subject::Layer(name) => (&mut self.layer_names, name),
            Subject::Combo(name) => (&mut self.combo_names, name),
        };
        let original = match names.get(name) {
            Some(&original) => original,
            None => {
                names.insert(name.clone(), span);
                return;
            }
        };
        self.report(Diagnostic {
            kind: DiagnosticKind::DuplicateName { original },
            subject: subject.clone(),
            span,
            skipped: false,
        });
    }

    fn report(&mut self, diagnostic: Diagnostic) {
        warn!(skipped = diagnostic.skipped, "{}", diagnostic);
        self.diagnostics.push(diagnostic);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::BindingErrorKind;
    use crate::model::{Behavior, Param};

    fn extract_source(source: &str) -> Result<Parsed, StructureError> {
        let root = keymap_parse::parse(source).expect("should parse");
        extract(&root)
    }

    fn extracted(source: &str) -> Parsed {
        extract_source(source).expect("should extract")
    }

    #[test]
    fn test_combo_scenario() {
        let parsed = extracted(
            "combos { combo_esc { timeout-ms = <50>; key-positions = <0 1>; bindings = <&kp ESC>; }; };",
        );
        assert!(parsed.is_clean());
        assert_eq!(
            parsed.model.combos,
            vec![Combo {
                name: "combo_esc".to_string(),
                timeout_ms: 50,
                key_positions: vec![0, 1],
                binding: Behavior::new("kp", vec![Param::KeyCode("ESC".to_string())]),
                layers: vec![],
            }]
        );
        assert!(parsed.model.layers.is_empty());
    }

    #[test]
    fn test_combo_layers_property() {
        let parsed = extracted(
            "combos { c { timeout-ms = <30>; key-positions = <3 4>; bindings = <&mo 2>; layers = <0 1>; }; };",
        );
        assert_eq!(parsed.model.combos[0].layers, vec![0, 1]);
    }

    #[test]
    fn test_combo_missing_property_is_skipped() {
        let parsed = extracted(
            r#"combos {
                broken { key-positions = <0 1>; bindings = <&kp A>; };
                fine { timeout-ms = <50>; key-positions = <2 3>; bindings = <&kp B>; };
            };"#,
        );
        assert_eq!(parsed.model.combos.len(), 1);
        assert_eq!(parsed.model.combos[0].name, "fine");

        assert_eq!(parsed.diagnostics.len(), 1);
        let diagnostic = &parsed.diagnostics[0];
        assert_eq!(
            diagnostic.kind,
            DiagnosticKind::MissingProperty {
                property: "timeout-ms"
            }
        );
        assert_eq!(diagnostic.subject, Subject::Combo("broken".to_string()));
        assert!(diagnostic.skipped);
        insta::assert_snapshot!(diagnostic, @"combo `broken` has no `timeout-ms` property at offset 25");
    }

    #[test]
    fn test_combo_with_two_bindings_is_skipped() {
        let parsed = extracted(
            "combos { c { timeout-ms = <50>; key-positions = <0 1>; bindings = <&kp A &kp B>; }; };",
        );
        assert!(parsed.model.combos.is_empty());
        assert_eq!(
            parsed.diagnostics[0].kind,
            DiagnosticKind::ComboBindingCount { found: 2 }
        );
    }

    #[test]
    fn test_combo_with_no_bindings_is_skipped() {
        let parsed = extracted(
            "combos { c { timeout-ms = <50>; key-positions = <0 1>; bindings = <>; }; };",
        );
        assert!(parsed.model.combos.is_empty());
        assert_eq!(
            parsed.diagnostics[0].kind,
            DiagnosticKind::ComboBindingCount { found: 0 }
        );
    }

    #[test]
    fn test_combo_invalid_timeout() {
        let parsed = extracted(
            "combos { c { timeout-ms = <50 60>; key-positions = <0 1>; bindings = <&kp A>; }; };",
        );
        assert!(parsed.model.combos.is_empty());
        match &parsed.diagnostics[0].kind {
            DiagnosticKind::InvalidProperty { property, error } => {
                assert_eq!(property, "timeout-ms");
                assert_eq!(
                    error.kind,
                    BindingErrorKind::WrongCellCount {
                        expected: 1,
                        found: 2
                    }
                );
            }
            other => panic!("unexpected diagnostic {:?}", other),
        }
    }

    #[test]
    fn test_layers_in_source_order() {
        let parsed = extracted(
            r#"keymap {
                compatible = "zmk,keymap";
                default_layer { bindings = <&kp A>; };
                left_layer { bindings = <&kp B>; };
                right_layer { bindings = <&kp C>; };
                tri_layer { bindings = <&trans>; };
            };"#,
        );
        let names: Vec<_> = parsed.model.layers.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["default_layer", "left_layer", "right_layer", "tri_layer"]
        );
    }

    #[test]
    fn test_layer_optional_properties() {
        let parsed = extracted(
            r#"keymap {
                base {
                    display-name = "Base";
                    bindings = <&kp A>;
                    sensor-bindings = <&inc_dec_kp C_VOL_UP C_VOL_DN>;
                };
                old { label = "Old"; bindings = <&kp B>; };
            };"#,
        );
        assert!(parsed.is_clean());
        let base = &parsed.model.layers[0];
        assert_eq!(base.display_name.as_deref(), Some("Base"));
        assert_eq!(base.sensor_bindings[0].to_string(), "&inc_dec_kp C_VOL_UP C_VOL_DN");
        assert_eq!(parsed.model.layers[1].title(), "Old");
    }

    #[test]
    fn test_invalid_optional_property_keeps_layer() {
        let parsed = extracted("keymap { base { display-name = <1>; bindings = <&kp A>; }; };");
        assert_eq!(parsed.model.layers.len(), 1);
        assert_eq!(parsed.model.layers[0].display_name, None);
        assert_eq!(parsed.diagnostics.len(), 1);
        assert!(!parsed.diagnostics[0].skipped);
    }

    #[test]
    fn test_layer_without_bindings_is_skipped() {
        let parsed = extracted("keymap { empty { }; base { bindings = <&kp A>; }; };");
        assert_eq!(parsed.model.layers.len(), 1);
        assert_eq!(
            parsed.diagnostics[0].kind,
            DiagnosticKind::MissingProperty {
                property: "bindings"
            }
        );
        assert_eq!(parsed.diagnostics[0].subject, Subject::Layer("empty".into()));
    }

    #[test]
    fn test_duplicate_names_are_kept_and_reported() {
        let source = "keymap { nav { bindings = <&kp A>; }; nav { bindings = <&kp B>; }; };";
        let parsed = extracted(source);
        assert_eq!(parsed.model.layers.len(), 2);
        assert_eq!(parsed.model.layer("nav").map(|l| l.bindings[0].to_string()), Some("&kp A".into()));

        assert_eq!(parsed.diagnostics.len(), 1);
        match parsed.diagnostics[0].kind {
            DiagnosticKind::DuplicateName { original } => {
                assert_eq!(original.slice(source), "nav { bindings = <&kp A>; };");
            }
            ref other => panic!("unexpected diagnostic {:?}", other),
        }
        assert!(!parsed.diagnostics[0].skipped);
    }

    #[test]
    fn test_same_name_for_layer_and_combo_is_fine() {
        let parsed = extracted(
            r#"combos { nav { timeout-ms = <50>; key-positions = <0 1>; bindings = <&mo 1>; }; };
               keymap { nav { bindings = <&kp A>; }; };"#,
        );
        assert!(parsed.is_clean());
    }

    #[test]
    fn test_reference_nodes_are_ignored() {
        let parsed = extracted(
            r#"&keymap { base { bindings = <&kp Z>; }; };
               keymap { base { bindings = <&kp A>; }; };"#,
        );
        assert_eq!(parsed.model.layers.len(), 1);
        assert_eq!(parsed.model.layers[0].bindings[0].to_string(), "&kp A");
    }

    #[test]
    fn test_nested_containers_are_found() {
        let parsed = extracted("/ { outer { keymap { base { bindings = <&kp A>; }; }; }; };");
        assert_eq!(parsed.model.layers.len(), 1);
    }

    #[test]
    fn test_keymap_without_layers_is_still_a_keymap() {
        let parsed = extracted(r#"/ { keymap { compatible = "zmk,keymap"; }; };"#);
        assert!(parsed.model.is_empty());
    }

    #[test]
    fn test_no_containers_is_a_structure_error() {
        let err = extract_source(r#"/ { chosen { zmk,kscan = &kscan0; }; };"#)
            .expect_err("nothing to extract");
        assert_eq!(err.to_string(), "no `keymap` or `combos` node found");
    }
}
