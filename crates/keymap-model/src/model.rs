//! The extracted keymap: layers, combos and the behaviors bound to keys.

use std::fmt;

/// One parameter of a behavior invocation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Param {
    /// Raw keycode text, kept verbatim: `ESC`, `LSFT`, `LC(LS(TAB))`.
    KeyCode(String),
    /// Integer literal, e.g. the layer index in `&mo 1`.
    Number(i64),
}

impl Param {
    /// The keycode text, if this is a keycode.
    pub fn as_key_code(&self) -> Option<&str> {
        match self {
            Param::KeyCode(text) => Some(text),
            Param::Number(_) => None,
        }
    }

    /// The integer value, if this is a number.
    pub fn as_number(&self) -> Option<i64> {
        match self {
            Param::KeyCode(_) => None,
            Param::Number(value) => Some(*value),
        }
    }
}

/// Keycodes print verbatim, numbers in decimal.
impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Param::KeyCode(text) => f.write_str(text),
            Param::Number(value) => write!(f, "{}", value),
        }
    }
}

/// A single `&action p1 p2 ...` invocation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Behavior {
    /// Behavior name without the `&`: `kp`, `mt`, `mo`, `trans`.
    pub action: String,
    /// Everything between this reference and the next one.
    pub params: Vec<Param>,
}

impl Behavior {
    /// Create a behavior invocation.
    pub fn new(action: impl Into<String>, params: Vec<Param>) -> Self {
        Self {
            action: action.into(),
            params,
        }
    }

    /// Legend lines to draw on a key, one per parameter.
    pub fn legend(&self) -> Vec<String> {
        self.params.iter().map(Param::to_string).collect()
    }
}

/// Prints the invocation back in source form, e.g. `&mt LSFT Z`.
impl fmt::Display for Behavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "&{}", self.action)?;
        for param in &self.params {
            write!(f, " {}", param)?;
        }
        Ok(())
    }
}

/// A named layer. `bindings[i]` is what physical key `i` does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layer {
    /// Node name, e.g. `default_layer`.
    pub name: String,
    /// Human-facing name from `display-name` (or the older `label`).
    pub display_name: Option<String>,
    /// One behavior per key position.
    pub bindings: Vec<Behavior>,
    /// Encoder bindings from `sensor-bindings`, empty when absent.
    pub sensor_bindings: Vec<Behavior>,
}

impl Layer {
    /// Behavior bound to a key position.
    pub fn binding(&self, position: usize) -> Option<&Behavior> {
        self.bindings.get(position)
    }

    /// The display name if there is one, the node name otherwise.
    pub fn title(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }
}

/// A behavior fired by pressing several keys together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Combo {
    /// Node name, e.g. `combo_esc`.
    pub name: String,
    /// How close together the presses must be.
    pub timeout_ms: i64,
    /// Key positions that make up the combo, in source order.
    pub key_positions: Vec<i64>,
    /// What the combo does.
    pub binding: Behavior,
    /// Layer indices the combo is limited to. Empty means every layer.
    pub layers: Vec<i64>,
}

impl Combo {
    /// Whether the combo is active on the given layer index.
    pub fn is_active_on(&self, layer: i64) -> bool {
        self.layers.is_empty() || self.layers.contains(&layer)
    }
}

/// Everything extracted from a keymap file, in source order.
///
/// Names are not deduplicated; two layers called `nav` both show up here.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct KeymapModel {
    /// Layers in the order they were defined.
    pub layers: Vec<Layer>,
    /// Combos in the order they were defined.
    pub combos: Vec<Combo>,
}

impl KeymapModel {
    /// First layer with the given node name.
    pub fn layer(&self, name: &str) -> Option<&Layer> {
        self.layers.iter().find(|l| l.name == name)
    }

    /// First combo with the given node name.
    pub fn combo(&self, name: &str) -> Option<&Combo> {
        self.combos.iter().find(|c| c.name == name)
    }

    /// Whether neither layers nor combos were found.
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty() && self.combos.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kp(key: &str) -> Behavior {
        Behavior::new("kp", vec![Param::KeyCode(key.to_string())])
    }

    #[test]
    fn test_behavior_display() {
        assert_eq!(kp("ESC").to_string(), "&kp ESC");
        assert_eq!(Behavior::new("trans", vec![]).to_string(), "&trans");
        assert_eq!(
            Behavior::new("lt", vec![Param::Number(2), Param::KeyCode("SPC".into())]).to_string(),
            "&lt 2 SPC"
        );
    }

    #[test]
    fn test_legend() {
        let mt = Behavior::new(
            "mt",
            vec![Param::KeyCode("LSFT".into()), Param::KeyCode("RET".into())],
        );
        assert_eq!(mt.legend(), vec!["LSFT", "RET"]);
        assert_eq!(
            Behavior::new("mo", vec![Param::Number(-1)]).legend(),
            vec!["-1"]
        );
        assert!(Behavior::new("trans", vec![]).legend().is_empty());
    }

    #[test]
    fn test_param_accessors() {
        assert_eq!(Param::KeyCode("A".into()).as_key_code(), Some("A"));
        assert_eq!(Param::KeyCode("A".into()).as_number(), None);
        assert_eq!(Param::Number(3).as_number(), Some(3));
    }

    #[test]
    fn test_layer_lookup() {
        let layer = Layer {
            name: "nav".into(),
            display_name: None,
            bindings: vec![kp("LEFT"), kp("RIGHT")],
            sensor_bindings: vec![],
        };
        assert_eq!(layer.binding(1), Some(&kp("RIGHT")));
        assert_eq!(layer.binding(2), None);
        assert_eq!(layer.title(), "nav");

        let named = Layer {
            display_name: Some("Navigation".into()),
            ..layer
        };
        assert_eq!(named.title(), "Navigation");
    }

    #[test]
    fn test_combo_layers() {
        let combo = Combo {
            name: "c".into(),
            timeout_ms: 50,
            key_positions: vec![0, 1],
            binding: kp("ESC"),
            layers: vec![],
        };
        assert!(combo.is_active_on(3));

        let limited = Combo {
            layers: vec![0, 2],
            ..combo
        };
        assert!(limited.is_active_on(2));
        assert!(!limited.is_active_on(1));
    }

    #[test]
    fn test_model_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<KeymapModel>();
    }
}
