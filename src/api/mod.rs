pub mod convert;
pub mod frontend;
pub mod jobs;
pub mod palettes;

pub use convert::{handle_convert, ConvertForm, ConvertResponse, __path_handle_convert};
pub use frontend::{handle_index, handle_static};
pub use jobs::{
    handle_job_status, handle_output, JobResult, JobStatusResponse, __path_handle_job_status,
    __path_handle_output,
};
pub use palettes::{
    handle_palettes, handle_queue_stats, PalettesResponse, PresetPalette, QueueStats,
    __path_handle_palettes, __path_handle_queue_stats,
};
