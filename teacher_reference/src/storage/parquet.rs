//! Parquet Storage Format Implementation
//!
//! Provides efficient columnar storage for Datalog relations using Apache Parquet format.
//! Parquet offers:
//! - 10x compression vs CSV
//! - Fast columnar reads
//! - Schema awareness
//! - Industry-standard format

use arrow::array::{Array, Int32Array, RecordBatch};
use arrow::datatypes::{DataType, Field, Schema};
use parquet::arrow::{arrow_reader::ParquetRecordBatchReaderBuilder, ArrowWriter};
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use std::fs::File;
