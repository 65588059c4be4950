//! Macros for reducing boilerplate when defining entities
//!
//! `impl_data_entity!` generates the struct with its identity and audit
//! fields, a `new` constructor and the `Entity`/`Data` implementations.

/// Complete macro to create a Data entity with automatic trait implementations
///
/// Every field type must convert into [`FieldValue`](crate::core::field::FieldValue)
/// so that it can be searched and exported.
///
/// # Example
///
/// ```rust,ignore
/// impl_data_entity!(
///     /// A note written by a user
///     Note,
///     "note",
///     "notes",
///     ["text"],
///     owner: author,
///     {
///         author: Uuid,
///         text: String,
///     }
/// );
///
/// let note = Note::new(user_id, "hello".to_string());
/// ```
#[macro_export]
macro_rules! impl_data_entity {
    (
        $(#[$struct_meta:meta])*
        $type:ident,
        $singular:expr,
        $plural:expr,
        [ $( $indexed_field:expr ),* $(,)? ],
        $( owner: $owner:ident, )?
        {
            $( $(#[$field_meta:meta])* $field:ident : $field_type:ty ),* $(,)?
        }
    ) => {
        $(#[$struct_meta])*
        #[derive(Debug, Clone, PartialEq, ::serde::Serialize, ::serde::Deserialize)]
        pub struct $type {
            /// Unique identifier, assigned at creation and never reused
            pub id: ::uuid::Uuid,

            $( $(#[$field_meta])* pub $field : $field_type, )*

            /// When this entity was created
            pub created_at: ::chrono::DateTime<::chrono::Utc>,

            /// When this entity was last updated
            pub updated_at: ::chrono::DateTime<::chrono::Utc>,
        }

        impl $type {
            /// Create a new instance with a fresh id and current timestamps
            #[allow(clippy::too_many_arguments)]
            pub fn new($( $field : $field_type ),*) -> Self {
                let now = ::chrono::Utc::now();
                Self {
                    id: ::uuid::Uuid::new_v4(),
                    $( $field, )*
                    created_at: now,
                    updated_at: now,
                }
            }
        }

        impl $crate::core::entity::Entity for $type {
            fn resource_name() -> &'static str {
                $plural
            }

            fn resource_name_singular() -> &'static str {
                $singular
            }

            fn id(&self) -> ::uuid::Uuid {
                self.id
            }

            fn created_at(&self) -> ::chrono::DateTime<::chrono::Utc> {
                self.created_at
            }

            fn updated_at(&self) -> ::chrono::DateTime<::chrono::Utc> {
                self.updated_at
            }

            fn touch(&mut self) {
                self.updated_at = ::chrono::Utc::now();
            }
        }

        impl $crate::core::entity::Data for $type {
            fn indexed_fields() -> &'static [&'static str] {
                &[ $( $indexed_field ),* ]
            }

            fn field_value(&self, field: &str) -> Option<$crate::core::field::FieldValue> {
                use $crate::core::field::FieldValue;
                match field {
                    "id" => Some(FieldValue::Uuid(self.id)),
                    "created_at" => Some(FieldValue::DateTime(self.created_at)),
                    "updated_at" => Some(FieldValue::DateTime(self.updated_at)),
                    $( stringify!($field) => Some(FieldValue::from(self.$field.clone())), )*
                    _ => None,
                }
            }

            $(
                fn owner_id(&self) -> Option<::uuid::Uuid> {
                    Some(self.$owner)
                }
            )?
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::core::entity::{Data, Entity};
    use crate::core::field::FieldValue;
    use uuid::Uuid;

    impl_data_entity!(
        /// Entity used only by these tests
        Note,
        "note",
        "notes",
        ["text"],
        owner: author,
        {
            author: Uuid,
            text: String,
            tag: Option<String>,
        }
    );

    impl_data_entity!(Tag, "tag", "tags", ["label"], {
        label: String,
    });

    #[test]
    fn test_generated_entity() {
        let author = Uuid::new_v4();
        let note = Note::new(author, "hello".into(), None);
        assert_eq!(Note::resource_name(), "notes");
        assert_eq!(Note::resource_name_singular(), "note");
        assert_eq!(note.created_at, note.updated_at);
        assert_eq!(note.owner_id(), Some(author));
        assert_eq!(Note::indexed_fields(), &["text"]);
    }

    #[test]
    fn test_generated_field_values() {
        let note = Note::new(Uuid::new_v4(), "hello".into(), Some("x".into()));
        assert_eq!(note.field_value("text"), Some(FieldValue::from("hello")));
        assert_eq!(note.field_value("tag"), Some(FieldValue::from("x")));
        assert_eq!(note.field_value("id"), Some(FieldValue::Uuid(note.id)));
        assert_eq!(note.field_value("nope"), None);
    }

    #[test]
    fn test_no_owner_by_default() {
        let tag = Tag::new("tools".into());
        assert_eq!(tag.owner_id(), None);
    }
}
