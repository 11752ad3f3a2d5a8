mod support;

mod decode_any;
mod decode_extensions;
mod decode_maps;
mod decode_required;

#[cfg(feature = "legacy")]
mod legacy;
