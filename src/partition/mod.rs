//! Size-bounded output partitioning.
//!
//! One conversion run produces a definitions file, a complete inserts
//! file, and a series of insert chunk files bounded by a line threshold.
//! Concatenating the chunks reproduces the complete inserts file exactly,
//! minus the comment-only lines that go to the complete file alone.
//! Streams open lazily on first write so an input with no inserts never
//! creates empty insert files.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

pub const WRITER_BUFFER_SIZE: usize = 256 * 1024;
const FLUSH_INTERVAL: usize = 100;

const DEFINITIONS_HEADER: &str =
    "-- Converted from Oracle SQL export\n-- Target dialect: SQL Server\n\n";

struct StreamWriter {
    writer: BufWriter<File>,
    write_count: usize,
}

impl StreamWriter {
    fn create(path: &PathBuf) -> std::io::Result<Self> {
        let file = File::create(path)?;
        Ok(Self {
            writer: BufWriter::with_capacity(WRITER_BUFFER_SIZE, file),
            write_count: 0,
        })
    }

    fn write_block(&mut self, block: &str) -> std::io::Result<()> {
        self.writer.write_all(block.as_bytes())?;
        self.writer.write_all(b"\n")?;

        self.write_count += 1;
        if self.write_count >= FLUSH_INTERVAL {
            self.write_count = 0;
            self.writer.flush()?;
        }
        Ok(())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.write_count = 0;
        self.writer.flush()
    }
}

pub struct OutputPartitioner {
    base: String,
    chunk_limit: u64,
    dry_run: bool,
    definitions: Option<StreamWriter>,
    all_inserts: Option<StreamWriter>,
    chunk: Option<StreamWriter>,
    chunk_index: u32,
    chunk_line_count: u64,
    chunks_written: u64,
}

impl OutputPartitioner {
    /// `base` is the path prefix every output file name is derived from.
    pub fn new(base: &str, chunk_limit: u64) -> Self {
        Self {
            base: base.to_string(),
            chunk_limit: chunk_limit.max(1),
            dry_run: false,
            definitions: None,
            all_inserts: None,
            chunk: None,
            chunk_index: 0,
            chunk_line_count: 0,
            chunks_written: 0,
        }
    }

    /// Count rotations without creating any files.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn definitions_path(&self) -> PathBuf {
        PathBuf::from(format!("{}_definitions.sql", self.base))
    }

    pub fn all_inserts_path(&self) -> PathBuf {
        PathBuf::from(format!("{}_inserts_all.sql", self.base))
    }

    pub fn chunk_path(&self, index: u32) -> PathBuf {
        PathBuf::from(format!("{}_inserts_chunk_{:02}.sql", self.base, index))
    }

    pub fn chunks_written(&self) -> u64 {
        self.chunks_written
    }

    /// Write a schema block to the definitions stream.
    pub fn write_definition(&mut self, block: &str) -> std::io::Result<()> {
        if self.dry_run {
            return Ok(());
        }
        if let Some(writer) = &mut self.definitions {
            return writer.write_block(block);
        }
        let mut writer = StreamWriter::create(&self.definitions_path())?;
        writer.writer.write_all(DEFINITIONS_HEADER.as_bytes())?;
        writer.write_block(block)?;
        self.definitions = Some(writer);
        Ok(())
    }

    /// Write a rewritten insert (or an insert skip comment) to the
    /// complete inserts file and the current chunk, rotating first when
    /// the statement would push the chunk past the line threshold.
    pub fn write_insert(&mut self, stmt: &str) -> std::io::Result<()> {
        let lines = line_count(stmt);
        self.write_all_inserts(stmt)?;

        let needs_rotation = self.chunks_written == 0
            || (self.chunk_line_count > 0 && self.chunk_line_count + lines > self.chunk_limit);
        if needs_rotation {
            self.rotate_chunk()?;
        }
        if let Some(chunk) = &mut self.chunk {
            chunk.write_block(stmt)?;
        }
        self.chunk_line_count += lines;
        Ok(())
    }

    /// Write an inert comment to the complete inserts file only. Chunks
    /// carry executable inserts and skip markers, nothing else.
    pub fn write_comment(&mut self, comment: &str) -> std::io::Result<()> {
        self.write_all_inserts(comment)
    }

    fn write_all_inserts(&mut self, block: &str) -> std::io::Result<()> {
        if self.dry_run {
            return Ok(());
        }
        if let Some(writer) = &mut self.all_inserts {
            return writer.write_block(block);
        }
        let mut writer = StreamWriter::create(&self.all_inserts_path())?;
        writer.write_block(block)?;
        self.all_inserts = Some(writer);
        Ok(())
    }

    fn rotate_chunk(&mut self) -> std::io::Result<()> {
        if let Some(chunk) = &mut self.chunk {
            chunk.flush()?;
        }
        self.chunk_index += 1;
        self.chunk_line_count = 0;
        self.chunks_written += 1;
        if !self.dry_run {
            self.chunk = Some(StreamWriter::create(&self.chunk_path(self.chunk_index))?);
        }
        Ok(())
    }

    pub fn close(&mut self) -> std::io::Result<()> {
        if let Some(w) = &mut self.definitions {
            w.flush()?;
        }
        if let Some(w) = &mut self.all_inserts {
            w.flush()?;
        }
        if let Some(w) = &mut self.chunk {
            w.flush()?;
        }
        Ok(())
    }
}

/// Lines a statement occupies in the output, including the appended
/// newline.
fn line_count(stmt: &str) -> u64 {
    stmt.lines().count().max(1) as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn base_in(dir: &TempDir) -> String {
        dir.path().join("out").to_string_lossy().into_owned()
    }

    #[test]
    fn test_lazy_stream_creation() {
        let dir = TempDir::new().unwrap();
        let base = base_in(&dir);
        let mut part = OutputPartitioner::new(&base, 10);
        part.write_definition("CREATE TABLE [A].[T] (\n    [ID] INT\n);")
            .unwrap();
        part.close().unwrap();

        assert!(part.definitions_path().exists());
        assert!(!part.all_inserts_path().exists());
        assert!(!part.chunk_path(1).exists());
    }

    #[test]
    fn test_definitions_header_written_once() {
        let dir = TempDir::new().unwrap();
        let mut part = OutputPartitioner::new(&base_in(&dir), 10);
        part.write_definition("A;").unwrap();
        part.write_definition("B;").unwrap();
        part.close().unwrap();

        let text = fs::read_to_string(part.definitions_path()).unwrap();
        assert_eq!(text.matches("Converted from Oracle").count(), 1);
        assert!(text.contains("A;\n"));
        assert!(text.contains("B;\n"));
    }

    #[test]
    fn test_chunk_rotation_at_line_limit() {
        let dir = TempDir::new().unwrap();
        let mut part = OutputPartitioner::new(&base_in(&dir), 3);
        for i in 0..7 {
            part.write_insert(&format!("INSERT INTO [A].[T] VALUES ({});", i))
                .unwrap();
        }
        part.close().unwrap();

        assert_eq!(part.chunks_written(), 3);
        for index in 1..=3 {
            let text = fs::read_to_string(part.chunk_path(index)).unwrap();
            assert!(text.lines().count() <= 3, "chunk {} too long", index);
        }
        assert!(!part.chunk_path(4).exists());
    }

    #[test]
    fn test_chunk_concatenation_matches_all_inserts() {
        let dir = TempDir::new().unwrap();
        let mut part = OutputPartitioner::new(&base_in(&dir), 2);
        for i in 0..5 {
            part.write_insert(&format!("INSERT INTO [A].[T] VALUES ({});", i))
                .unwrap();
        }
        part.close().unwrap();

        let all = fs::read_to_string(part.all_inserts_path()).unwrap();
        let mut joined = String::new();
        for index in 1..=part.chunks_written() as u32 {
            joined.push_str(&fs::read_to_string(part.chunk_path(index)).unwrap());
        }
        assert_eq!(all, joined);
    }

    #[test]
    fn test_statement_never_split_across_chunks() {
        let dir = TempDir::new().unwrap();
        let mut part = OutputPartitioner::new(&base_in(&dir), 3);
        part.write_insert("INSERT INTO [A].[T] VALUES (1);").unwrap();
        part.write_insert("INSERT INTO [A].[T]\nVALUES\n(2);").unwrap();
        part.close().unwrap();

        // The three-line statement would overflow chunk 1, so it opens
        // chunk 2 whole.
        let first = fs::read_to_string(part.chunk_path(1)).unwrap();
        let second = fs::read_to_string(part.chunk_path(2)).unwrap();
        assert_eq!(first, "INSERT INTO [A].[T] VALUES (1);\n");
        assert!(second.starts_with("INSERT INTO [A].[T]\nVALUES\n(2);"));
    }

    #[test]
    fn test_comments_only_in_all_inserts() {
        let dir = TempDir::new().unwrap();
        let mut part = OutputPartitioner::new(&base_in(&dir), 10);
        part.write_comment("-- SET DEFINE OFF; (Oracle specific, commented out)")
            .unwrap();
        part.write_insert("INSERT INTO [A].[T] VALUES (1);").unwrap();
        part.close().unwrap();

        let all = fs::read_to_string(part.all_inserts_path()).unwrap();
        let chunk = fs::read_to_string(part.chunk_path(1)).unwrap();
        assert!(all.contains("SET DEFINE"));
        assert!(!chunk.contains("SET DEFINE"));
    }

    #[test]
    fn test_oversized_single_statement_gets_own_chunk() {
        let dir = TempDir::new().unwrap();
        let mut part = OutputPartitioner::new(&base_in(&dir), 2);
        let big = "INSERT INTO [A].[T] VALUES (\n1,\n2,\n3\n);";
        part.write_insert(big).unwrap();
        part.write_insert("INSERT INTO [A].[T] VALUES (9);").unwrap();
        part.close().unwrap();

        let first = fs::read_to_string(part.chunk_path(1)).unwrap();
        assert!(first.contains("1,\n2,\n3"));
        let second = fs::read_to_string(part.chunk_path(2)).unwrap();
        assert!(second.contains("VALUES (9)"));
    }
}
