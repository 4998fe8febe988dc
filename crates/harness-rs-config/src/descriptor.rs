//! Field descriptor tables.
//!
//! A [`Schema`] type publishes one [`FieldDescriptor`] per field, in
//! declaration order. The resolver walks these tables for the default and
//! environment passes; overlays go through serde instead.

use crate::ConfigError;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt;

/// A configuration structure described by a static field table.
pub trait Schema: Serialize + DeserializeOwned + 'static {
    /// Descriptor table in declaration order.
    fn fields() -> &'static [FieldDescriptor<Self>];

    /// Flatten the descriptor tree into one row per leaf field.
    fn describe() -> Vec<FieldInfo> {
        let mut rows = Vec::new();
        describe_into::<Self>("", &mut rows);
        rows
    }
}

/// Build a plain `fn` pointer that borrows one field of a struct.
///
/// ```ignore
/// FieldDescriptor::string("name", field_accessor!(ClusterConfig, name: String))
/// ```
#[macro_export]
macro_rules! field_accessor {
    ($owner:ty, $field:ident : $field_ty:ty) => {{
        fn access(owner: &mut $owner) -> &mut $field_ty {
            &mut owner.$field
        }
        access
    }};
}

/// Type-erased walker over a nested schema.
type NestedWalk<T> =
    Box<dyn Fn(&mut T, &str, &mut dyn LeafVisitor) -> Result<(), ConfigError> + Send + Sync>;

/// Storage slot for a single field.
pub enum FieldSlot<T> {
    String(fn(&mut T) -> &mut String),
    Bool(fn(&mut T) -> &mut bool),
    Int32(fn(&mut T) -> &mut i32),
    Int64(fn(&mut T) -> &mut i64),
    StringList(fn(&mut T) -> &mut Vec<String>),
    Nested(NestedSchema<T>),
}

/// Nested schema reference, recursed into transparently.
pub struct NestedSchema<T> {
    walk: NestedWalk<T>,
    describe: fn(&str, &mut Vec<FieldInfo>),
}

/// Static metadata for one configuration field.
pub struct FieldDescriptor<T> {
    /// Serialized key of the field inside its parent mapping.
    pub name: &'static str,
    /// Literal applied during the default pass.
    pub default: Option<&'static str>,
    /// Environment variable read during the environment pass.
    pub env: Option<&'static str>,
    /// Documentation grouping.
    pub section: Option<&'static str>,
    /// One-line description.
    pub help: Option<&'static str>,
    pub slot: FieldSlot<T>,
}

impl<T: 'static> FieldDescriptor<T> {
    fn with_slot(name: &'static str, slot: FieldSlot<T>) -> Self {
        Self {
            name,
            default: None,
            env: None,
            section: None,
            help: None,
            slot,
        }
    }

    pub fn string(name: &'static str, access: fn(&mut T) -> &mut String) -> Self {
        Self::with_slot(name, FieldSlot::String(access))
    }

    pub fn bool(name: &'static str, access: fn(&mut T) -> &mut bool) -> Self {
        Self::with_slot(name, FieldSlot::Bool(access))
    }

    pub fn int32(name: &'static str, access: fn(&mut T) -> &mut i32) -> Self {
        Self::with_slot(name, FieldSlot::Int32(access))
    }

    pub fn int64(name: &'static str, access: fn(&mut T) -> &mut i64) -> Self {
        Self::with_slot(name, FieldSlot::Int64(access))
    }

    pub fn string_list(name: &'static str, access: fn(&mut T) -> &mut Vec<String>) -> Self {
        Self::with_slot(name, FieldSlot::StringList(access))
    }

    /// Describe a nested structure whose own table is walked recursively.
    pub fn nested<U: Schema>(name: &'static str, access: fn(&mut T) -> &mut U) -> Self {
        let walk: NestedWalk<T> = Box::new(
            move |owner: &mut T, prefix: &str, visitor: &mut dyn LeafVisitor| {
                walk_fields(access(owner), prefix, visitor)
            },
        );
        Self::with_slot(
            name,
            FieldSlot::Nested(NestedSchema {
                walk,
                describe: describe_into::<U>,
            }),
        )
    }

    /// Set the literal applied during the default pass.
    pub fn default_value(mut self, value: &'static str) -> Self {
        self.default = Some(value);
        self
    }

    /// Bind the field to an environment variable.
    pub fn env(mut self, name: &'static str) -> Self {
        self.env = Some(name);
        self
    }

    pub fn section(mut self, section: &'static str) -> Self {
        self.section = Some(section);
        self
    }

    pub fn help(mut self, help: &'static str) -> Self {
        self.help = Some(help);
        self
    }

    /// Semantic type of the field; `None` for nested structures.
    pub fn kind(&self) -> Option<FieldKind> {
        match self.slot {
            FieldSlot::String(_) => Some(FieldKind::String),
            FieldSlot::Bool(_) => Some(FieldKind::Bool),
            FieldSlot::Int32(_) => Some(FieldKind::Int32),
            FieldSlot::Int64(_) => Some(FieldKind::Int64),
            FieldSlot::StringList(_) => Some(FieldKind::StringList),
            FieldSlot::Nested(_) => None,
        }
    }
}

impl<T> fmt::Debug for FieldDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name)
            .field("default", &self.default)
            .field("env", &self.env)
            .field("section", &self.section)
            .finish_non_exhaustive()
    }
}

/// Semantic type of a leaf field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    String,
    Bool,
    Int32,
    Int64,
    StringList,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldKind::String => "string",
            FieldKind::Bool => "bool",
            FieldKind::Int32 => "int32",
            FieldKind::Int64 => "int64",
            FieldKind::StringList => "list",
        };
        f.write_str(name)
    }
}

/// Documentation row for a leaf field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldInfo {
    /// Dotted path of serialized keys, e.g. `cluster.region`.
    pub path: String,
    pub kind: FieldKind,
    pub default: Option<&'static str>,
    pub env: Option<&'static str>,
    pub section: Option<&'static str>,
    pub help: Option<&'static str>,
}

/// Mutable view of a leaf field during a walk.
pub enum FieldRef<'a> {
    String(&'a mut String),
    Bool(&'a mut bool),
    Int32(&'a mut i32),
    Int64(&'a mut i64),
    StringList(&'a mut Vec<String>),
}

/// A leaf field reached by [`walk_fields`].
pub struct Leaf<'a> {
    pub path: String,
    pub default: Option<&'static str>,
    pub env: Option<&'static str>,
    pub value: FieldRef<'a>,
}

/// Callback invoked for every leaf field, depth-first in declaration order.
pub trait LeafVisitor {
    fn visit(&mut self, leaf: Leaf<'_>) -> Result<(), ConfigError>;
}

/// Walk every leaf of `target`, recursing into nested schemas.
pub fn walk_fields<S: Schema>(
    target: &mut S,
    prefix: &str,
    visitor: &mut dyn LeafVisitor,
) -> Result<(), ConfigError> {
    for field in S::fields() {
        let path = join_path(prefix, field.name);
        let value = match &field.slot {
            FieldSlot::String(access) => FieldRef::String(access(&mut *target)),
            FieldSlot::Bool(access) => FieldRef::Bool(access(&mut *target)),
            FieldSlot::Int32(access) => FieldRef::Int32(access(&mut *target)),
            FieldSlot::Int64(access) => FieldRef::Int64(access(&mut *target)),
            FieldSlot::StringList(access) => FieldRef::StringList(access(&mut *target)),
            FieldSlot::Nested(nested) => {
                (nested.walk)(&mut *target, &path, &mut *visitor)?;
                continue;
            }
        };
        visitor.visit(Leaf {
            path,
            default: field.default,
            env: field.env,
            value,
        })?;
    }
    Ok(())
}

fn describe_into<S: Schema>(prefix: &str, rows: &mut Vec<FieldInfo>) {
    for field in S::fields() {
        let path = join_path(prefix, field.name);
        if let FieldSlot::Nested(nested) = &field.slot {
            (nested.describe)(&path, rows);
            continue;
        }
        if let Some(kind) = field.kind() {
            rows.push(FieldInfo {
                path,
                kind,
                default: field.default,
                env: field.env,
                section: field.section,
                help: field.help,
            });
        }
    }
}

/// Join a dotted path with a key.
pub(crate) fn join_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde::Deserialize;
    use std::sync::LazyLock;

    #[derive(Debug, Default, Serialize, Deserialize)]
    struct Inner {
        flag: bool,
        count: i64,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    struct Outer {
        name: String,
        inner: Inner,
        tags: Vec<String>,
    }

    impl Schema for Inner {
        fn fields() -> &'static [FieldDescriptor<Self>] {
            static FIELDS: LazyLock<Vec<FieldDescriptor<Inner>>> = LazyLock::new(|| {
                vec![
                    FieldDescriptor::bool("flag", field_accessor!(Inner, flag: bool))
                        .default_value("true"),
                    FieldDescriptor::int64("count", field_accessor!(Inner, count: i64))
                        .env("INNER_COUNT")
                        .section("Inner"),
                ]
            });
            FIELDS.as_slice()
        }
    }

    impl Schema for Outer {
        fn fields() -> &'static [FieldDescriptor<Self>] {
            static FIELDS: LazyLock<Vec<FieldDescriptor<Outer>>> = LazyLock::new(|| {
                vec![
                    FieldDescriptor::string("name", field_accessor!(Outer, name: String)),
                    FieldDescriptor::nested("inner", field_accessor!(Outer, inner: Inner)),
                    FieldDescriptor::string_list("tags", field_accessor!(Outer, tags: Vec<String>)),
                ]
            });
            FIELDS.as_slice()
        }
    }

    struct Collect(Vec<String>);

    impl LeafVisitor for Collect {
        fn visit(&mut self, leaf: Leaf<'_>) -> Result<(), ConfigError> {
            self.0.push(leaf.path);
            Ok(())
        }
    }

    #[test]
    fn walk_visits_leaves_depth_first() {
        let mut outer = Outer::default();
        let mut collect = Collect(Vec::new());
        walk_fields(&mut outer, "", &mut collect).expect("walk");
        assert_eq!(collect.0, vec!["name", "inner.flag", "inner.count", "tags"]);
    }

    #[test]
    fn walk_hands_out_mutable_slots() {
        struct SetCount;
        impl LeafVisitor for SetCount {
            fn visit(&mut self, leaf: Leaf<'_>) -> Result<(), ConfigError> {
                if let FieldRef::Int64(slot) = leaf.value {
                    *slot = 42;
                }
                Ok(())
            }
        }

        let mut outer = Outer::default();
        walk_fields(&mut outer, "", &mut SetCount).expect("walk");
        assert_eq!(outer.inner.count, 42);
    }

    #[test]
    fn describe_flattens_metadata() {
        let rows = Outer::describe();
        let count = rows
            .iter()
            .find(|row| row.path == "inner.count")
            .expect("count row");
        assert_eq!(count.kind, FieldKind::Int64);
        assert_eq!(count.env, Some("INNER_COUNT"));
        assert_eq!(count.section, Some("Inner"));
        assert_eq!(rows.len(), 4);
    }
}
