//! Macros for implementing registry contracts.

/// Implements [`Entry`](crate::Entry) for a struct with an `i32` id field.
///
/// The field defaults to `id`; pass a second argument to use another one.
///
/// # Examples
///
/// ```rust
/// use id_registry::{impl_entry, Entry};
///
/// struct Item {
///     id: i32,
///     name: &'static str,
/// }
/// impl_entry!(Item);
///
/// struct Recipe {
///     recipe_id: i32,
/// }
/// impl_entry!(Recipe, recipe_id);
///
/// let mut recipe = Recipe { recipe_id: 0 };
/// recipe.set_id(42);
/// assert_eq!(recipe.id(), 42);
/// ```
#[macro_export]
macro_rules! impl_entry {
    ($ty:ty) => {
        $crate::impl_entry!($ty, id);
    };
    ($ty:ty, $field:ident) => {
        impl $crate::Entry for $ty {
            fn id(&self) -> i32 {
                self.$field
            }

            fn set_id(&mut self, id: i32) {
                self.$field = id;
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::Entry;

    #[test]
    fn test_impl_entry_default_field() {
        struct Item {
            id: i32,
        }
        impl_entry!(Item);

        let mut item = Item { id: 1 };
        item.set_id(7);
        assert_eq!(item.id(), 7);
        assert_eq!(item.id, 7);
    }

    #[test]
    fn test_impl_entry_named_field() {
        struct Biome {
            biome_id: i32,
        }
        impl_entry!(Biome, biome_id);

        let mut biome = Biome { biome_id: 0 };
        biome.set_id(-3);
        assert_eq!(biome.biome_id, -3);
    }
}
