//! Result normalization module
//!
//! Every write returns one [`JobResult`] per batch, whatever endpoint it
//! went to. The caller names the endpoint with an [`Endpoint`]
//! discriminator and the job's polymorphic `result` is parsed into the
//! matching [`NormalizedResult`] variant:
//!
//! | Endpoint | Variant |
//! |----------|---------|
//! | `document-post`, `folder-post`, `term-post` | `Created` |
//! | `document-put`, `folder-put` | `Updated` |
//! | `document-delete`, `folder-delete`, `term-delete` | `Deleted` |
//! | `custom-field-post` | `CustomFields` |
//! | `rdbms-post` | `RelationalUpsert` |
//! | `virtual-datasource-post` | `VirtualDatasource` |
//! | `data-quality` | `DataQuality` |
//! | `dataflow-post`, `dataflow-patch` | `DataflowUpsert` |
//! | `dataflow-delete` | `DataflowDelete` |
//! | `policy-post`, `policy-put` | `Progress` |
//! | `generic` | `Passthrough` |

mod job_result;
mod normalize;
mod shapes;

pub use job_result::{created_objects, JobResult, JobResultStatus};
pub use normalize::{Endpoint, NormalizedResult};
pub use shapes::{
    ActionCount, ActionStats, CreatedObjects, CustomFieldIds, CustomFieldOutcome,
    DataQualitySummary, DataflowMapping, DataflowOutcome, DeletedObjects, KeyMapping, ObjectRef,
    RelationalOutcome, UpdatedObjects, VirtualDatasourceSummary,
};
