/// Implements [`Entity`](crate::entity_catalog::Entity) for an existing struct.
///
/// Fields are listed in declaration order. Each field may carry a column
/// annotation (`=> "ColumnName"`) and flags in brackets: `key`, `identity`,
/// `computed`, `not_mapped`. Field values travel through serde, so every listed
/// field type must be `Serialize + DeserializeOwned`.
///
/// ```ignore
/// impl_entity! {
///     #[table = "Products", schema = "dbo"]
///     Product {
///         product_id => "ProductID" [key, identity],
///         product_name => "ProductName",
///         category [not_mapped],
///     }
/// }
/// ```
#[macro_export]
macro_rules! impl_entity {
    (
        $( #[table = $table:literal $(, schema = $schema:literal )? ] )?
        $entity:ident {
            $( $field:ident $( => $column:literal )? $( [ $( $flag:ident ),* $(,)? ] )? ),* $(,)?
        }
    ) => {
        impl $crate::entity_catalog::Entity for $entity {
            fn descriptor() -> $crate::entity_catalog::EntityDescriptor {
                let descriptor = $crate::entity_catalog::EntityDescriptor::new(stringify!($entity));
                $(
                    let descriptor = descriptor.table($table);
                    $( let descriptor = descriptor.schema($schema); )?
                )?
                $(
                    let descriptor = descriptor.field(
                        $crate::entity_catalog::FieldDescriptor::new(stringify!($field))
                            $( .column($column) )?
                            $( $( .$flag() )* )?
                    );
                )*
                descriptor
            }

            fn field_value(&self, field: &str) -> Option<$crate::serde_json::Value> {
                $(
                    if field == stringify!($field) {
                        return Some(
                            $crate::serde_json::to_value(&self.$field)
                                .unwrap_or($crate::serde_json::Value::Null),
                        );
                    }
                )*
                None
            }

            fn set_field_value(
                &mut self,
                field: &str,
                value: $crate::serde_json::Value,
            ) -> Result<(), $crate::entity_catalog::FieldAssignError> {
                $(
                    if field == stringify!($field) {
                        self.$field = $crate::serde_json::from_value(value).map_err(|e| {
                            $crate::entity_catalog::FieldAssignError::TypeMismatch {
                                field: field.to_string(),
                                message: e.to_string(),
                            }
                        })?;
                        return Ok(());
                    }
                )*
                Err($crate::entity_catalog::FieldAssignError::UnknownField {
                    entity: stringify!($entity).to_string(),
                    field: field.to_string(),
                })
            }
        }
    };
}
