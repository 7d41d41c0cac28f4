pub mod engine;
pub mod protocol;
pub mod wordcount;

pub use engine::{KeyValue, MapFn, ReduceFn};
pub use protocol::{
    FetchTaskRequest, FetchTaskResponse, JobStatusResponse, Phase, SubmitTaskRequest,
    SubmitTaskResponse, TaskAssignment, TaskId,
};
