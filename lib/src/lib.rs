// BEGIN - Embark standard lints v0.4
// do not change or add/remove here, but one can add exceptions after this section
// for more info see: <https://github.com/EmbarkStudios/rust-ecosystem/issues/59>
#![deny(unsafe_code)]
#![warn(
    clippy::all,
    clippy::await_holding_lock,
    clippy::char_lit_as_u8,
    clippy::checked_conversions,
    clippy::dbg_macro,
    clippy::debug_assert_with_mut_call,
    clippy::doc_markdown,
    clippy::empty_enum,
    clippy::enum_glob_use,
    clippy::exit,
    clippy::expl_impl_clone_on_copy,
    clippy::explicit_deref_methods,
    clippy::explicit_into_iter_loop,
    clippy::fallible_impl_from,
    clippy::filter_map_next,
    clippy::float_cmp_const,
    clippy::fn_params_excessive_bools,
    clippy::if_let_mutex,
    clippy::implicit_clone,
    clippy::imprecise_flops,
    clippy::inefficient_to_string,
    clippy::invalid_upcast_comparisons,
    clippy::large_types_passed_by_value,
    clippy::let_unit_value,
    clippy::linkedlist,
    clippy::lossy_float_literal,
    clippy::macro_use_imports,
    clippy::manual_ok_or,
    clippy::map_err_ignore,
    clippy::map_flatten,
    clippy::map_unwrap_or,
    clippy::match_on_vec_items,
    clippy::match_same_arms,
    clippy::match_wildcard_for_single_variants,
    clippy::mem_forget,
    clippy::mismatched_target_os,
    clippy::mut_mut,
    clippy::mutex_integer,
    clippy::needless_borrow,
    clippy::needless_continue,
    clippy::option_option,
    clippy::path_buf_push_overwrite,
    clippy::ptr_as_ptr,
    clippy::ref_option_ref,
    clippy::rest_pat_in_fully_bound_structs,
    clippy::same_functions_in_if_condition,
    clippy::semicolon_if_nothing_returned,
    clippy::string_add_assign,
    clippy::string_add,
    clippy::string_lit_as_bytes,
    clippy::string_to_string,
    clippy::todo,
    clippy::trait_duplication_in_bounds,
    clippy::unimplemented,
    clippy::unnested_or_patterns,
    clippy::unused_self,
    clippy::useless_transmute,
    clippy::verbose_file_reads,
    clippy::zero_sized_map_values,
    future_incompatible,
    nonstandard_style,
    rust_2018_idioms
)]
// END - Embark standard lints v0.4

//! `style-transfer` runs pre-trained image-to-image style models, such as
//! the AnimeGANv2 family and a set of sketch models, over a single content
//! image.
//!
//! First, you build a `Session` via a `SessionBuilder`, which follows the
//! builder pattern. Calling `build` on the `SessionBuilder` resolves the model
//! file for the chosen `Style` and loads it into the inference engine.
//!
//! `Session` has a `run()` method that decodes the content image, performs a
//! single forward pass and converts the output tensor back into an image,
//! which is returned as a `Stylized` along with the time spent in each stage.
//!
//! ## Styles
//!
//! | key             | output    |
//! |-----------------|-----------|
//! | `hayao_style`   | color     |
//! | `paprika_style` | color     |
//! | `selfie2anime`  | color     |
//! | `anime_sketch`  | grayscale |
//! | `open_sketch`   | grayscale |
//! | `contour_style` | grayscale |
//!
//! ## Usage
//!
//! ```no_run
//! // Create a new session for one of the built-in styles
//! let session = style_transfer::Session::builder()
//!     .style(style_transfer::Style::AnimeSketch)
//!     .model_dir("models")
//!     .threads(2)
//!     // Build the session, which loads the model
//!     .build().expect("failed to build session");
//!
//! // Stylize an image
//! let stylized = session.run(&"imgs/portrait.jpg").expect("failed to stylize");
//! println!("{}", stylized.log());
//!
//! // Save the stylized image to disk
//! stylized.save("portrait_sketch.png").expect("failed to save image");
//! ```
mod errors;
mod utils;

pub mod config;
pub mod interpreter;
pub mod model;
pub mod session;
pub mod tensor;

pub use image;
use std::fmt;
use std::path::{Path, PathBuf};

pub use config::Config;
pub use errors::Error;
pub use interpreter::{Delegate, Interpreter, InterpreterOptions, TractInterpreter};
pub use model::{ModelSpec, Normalization, OutputKind, Style, CONTENT_IMAGE_SIZE};
pub use session::{
    BatchProgress, BatchUpdate, ExecutionLog, Session, SessionBuilder, Stylized, Timings,
};
pub use utils::{check_output_extension, load_dynamic_image, ImageSource};

/// Directory model files are looked up in when none is configured
pub const DEFAULT_MODEL_DIR: &str = "models";

/// Simple dimensions struct
#[derive(Copy, Clone)]
pub struct Dims {
    pub width: u32,
    pub height: u32,
}

impl Dims {
    pub fn square(size: u32) -> Self {
        Self {
            width: size,
            height: size,
        }
    }
}
