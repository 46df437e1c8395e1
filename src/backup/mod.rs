pub mod archive;
pub mod cleanup;
pub mod compress;
pub mod config;
pub mod deliver;
pub mod encrypt;
pub mod file_ext;
pub mod finish;
pub mod pipeline;
pub mod process;
pub mod redacted;
pub mod result_error;
pub mod validate;

macro_rules! function_path {
    () => {
        concat!(module_path!(), "::", function_name!(), " ", file!(), ":", line!())
    };
}

pub(crate) use function_path;
