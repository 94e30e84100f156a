use serde::{Deserialize, Serialize};
use std::fmt;

/// One variant per syntactic category a script element can take. Families
/// that branch on a sub-shape (`inputs`, `presets`, `variables`,
/// `invocation`, `model`) get one flat variant per branch rather than a
/// variant carrying a nested tag — the branch is picked once, at parse
/// time, and never needs to change after.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Kind {
    Script,
    Step,

    InputBool,
    InputText,
    InputEnum,
    InputList,
    Option,

    PresetBool,
    PresetText,
    PresetEnum,
    PresetList,

    VariableBool,
    VariableText,
    VariableEnum,
    VariableList,

    Condition,

    /// Invokes another script by path (`<source src="...">`).
    InvokeSource,
    /// Invokes another script by path, with an optional remote `url`.
    InvokeExec,
    /// Declares a named, re-usable subtree (`<method name="...">...</method>`).
    InvokeMethod,
    /// Invokes a previously declared method by name (`<call method="...">`).
    InvokeCall,

    Output,

    ModelValue,
    ModelList,
    ModelMap,

    Templates,
    Files,
    Template,
    File,

    Transformation,
    Replace,

    Include,
    Exclude,

    Validation,
    Regex,
}

impl Kind {
    /// `true` for the four kinds that hand control to another subtree
    /// instead of describing output directly.
    pub fn is_invocation(self) -> bool {
        matches!(
            self,
            Kind::InvokeSource | Kind::InvokeExec | Kind::InvokeMethod | Kind::InvokeCall
        )
    }

    pub fn is_input(self) -> bool {
        matches!(
            self,
            Kind::InputBool | Kind::InputText | Kind::InputEnum | Kind::InputList
        )
    }

    pub fn is_preset(self) -> bool {
        matches!(
            self,
            Kind::PresetBool | Kind::PresetText | Kind::PresetEnum | Kind::PresetList
        )
    }

    pub fn is_variable(self) -> bool {
        matches!(
            self,
            Kind::VariableBool | Kind::VariableText | Kind::VariableEnum | Kind::VariableList
        )
    }

    pub fn is_model(self) -> bool {
        matches!(self, Kind::ModelValue | Kind::ModelList | Kind::ModelMap)
    }

    pub fn name(self) -> &'static str {
        match self {
            Kind::Script => "script",
            Kind::Step => "step",
            Kind::InputBool => "inputs.bool",
            Kind::InputText => "inputs.text",
            Kind::InputEnum => "inputs.enum",
            Kind::InputList => "inputs.list",
            Kind::Option => "option",
            Kind::PresetBool => "presets.bool",
            Kind::PresetText => "presets.text",
            Kind::PresetEnum => "presets.enum",
            Kind::PresetList => "presets.list",
            Kind::VariableBool => "variables.bool",
            Kind::VariableText => "variables.text",
            Kind::VariableEnum => "variables.enum",
            Kind::VariableList => "variables.list",
            Kind::Condition => "condition",
            Kind::InvokeSource => "source",
            Kind::InvokeExec => "exec",
            Kind::InvokeMethod => "method",
            Kind::InvokeCall => "call",
            Kind::Output => "output",
            Kind::ModelValue => "model.value",
            Kind::ModelList => "model.list",
            Kind::ModelMap => "model.map",
            Kind::Templates => "templates",
            Kind::Files => "files",
            Kind::Template => "template",
            Kind::File => "file",
            Kind::Transformation => "transformation",
            Kind::Replace => "replace",
            Kind::Include => "include",
            Kind::Exclude => "exclude",
            Kind::Validation => "validation",
            Kind::Regex => "regex",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
