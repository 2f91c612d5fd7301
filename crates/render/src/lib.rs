#![deny(missing_docs)]
//! inkpress render: render trees, transform passes, the compiler and the
//! view-time runtime.

pub mod compile;
pub mod lower;
pub mod processor;
/// Component overrides for the runtime.
pub mod registry;
pub mod runtime;
pub mod transform;
pub mod tree;

pub use compile::{CompileError, CompiledBody, FORMAT_VERSION, compile};
pub use lower::{LowerOptions, lower};
pub use processor::{ProcessError, Processed, Processor, ProcessorOptions};
pub use registry::{Component, ComponentTable};
pub use runtime::{RenderError, Rendered, Runtime};
pub use transform::{
    DiagramError, DiagramPolicy, DiagramRenderer, DiagramStrategy, HeadingEntry, HighlightThemes,
    MermaidCli, PassContext, TransformChain, TransformError, TreePass,
};
pub use tree::{Element, Node};
