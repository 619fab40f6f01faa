use codee::{Decoder, Encoder};
use leptos::prelude::*;
use leptos_use::storage::{use_storage_with_options, StorageType, UseStorageOptions};
use std::fmt::Debug;

/// `use_storage` with logging on storage and codec errors instead of silent failure.
///
/// A decode error is expected when the persisted format changed between releases. The stored
/// value is then treated as absent and overwritten on the next write, so a stale persisted
/// token can never wedge the session manager.
pub(crate) fn use_persistent<T, C>(
    storage_type: StorageType,
    key: &'static str,
) -> (Signal<T>, WriteSignal<T>, impl Fn() + Clone + Send + Sync)
where
    T: Default + Debug + Clone + PartialEq + Send + Sync + 'static,
    C: Encoder<T, Encoded = String> + Decoder<T, Encoded = str>,
    <C as Encoder<T>>::Error: Debug,
    <C as Decoder<T>>::Error: Debug,
{
    let options = UseStorageOptions::default()
        .listen_to_storage_changes(true)
        .delay_during_hydration(false)
        .on_error(move |err| {
            tracing::warn!(?err, "Error accessing '{key}' in storage");
        });
    use_storage_with_options::<T, C>(storage_type, key.to_owned(), options)
}
