//! Indentation-aware text builders for the two output surfaces.

/// Line writer with four-space indentation.
#[derive(Debug, Default)]
pub struct CodeWriter {
    output: String,
    indent: usize,
}

impl CodeWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn writeln(&mut self, s: &str) {
        if !s.is_empty() {
            for _ in 0..self.indent {
                self.output.push_str("    ");
            }
            self.output.push_str(s);
        }
        self.output.push('\n');
    }

    /// Write each line of `lines` at the current indentation.
    pub fn write_lines<I, S>(&mut self, lines: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for line in lines {
            self.writeln(line.as_ref());
        }
    }

    /// Write a multi-line snippet, keeping its relative indentation.
    pub fn write_block(&mut self, block: &str) {
        for line in block.trim_end().lines() {
            self.writeln(line.trim_end());
        }
    }

    pub fn blank(&mut self) {
        self.output.push('\n');
    }

    pub fn indent(&mut self) {
        self.indent += 1;
    }

    pub fn dedent(&mut self) {
        self.indent = self.indent.saturating_sub(1);
    }

    pub fn as_str(&self) -> &str {
        &self.output
    }

    pub fn finish(self) -> String {
        self.output
    }
}

/// Where the current `cdef extern from` block points.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ExternBlock {
    header: String,
    namespace: Option<String>,
}

/// Declaration surface (`.pxd`): entries grouped into extern blocks.
#[derive(Debug)]
pub struct PxdWriter {
    w: CodeWriter,
    block: Option<ExternBlock>,
}

impl PxdWriter {
    pub fn new() -> Self {
        let mut w = CodeWriter::new();
        w.writeln("# generated by deargen");
        w.writeln("from libcpp cimport bool");
        w.blank();
        Self { w, block: None }
    }

    /// Make sure the next entry lands in the block for `header`/`namespace`,
    /// reopening one if either changed.
    pub fn enter(&mut self, header: &str, namespace: Option<&str>) -> &mut CodeWriter {
        let wanted = ExternBlock {
            header: header.to_string(),
            namespace: namespace.map(str::to_string),
        };
        if self.block.as_ref() != Some(&wanted) {
            if self.block.is_some() {
                self.w.dedent();
                self.w.blank();
            }
            let line = match &wanted.namespace {
                Some(ns) => format!("cdef extern from \"{}\" namespace \"{}\":", wanted.header, ns),
                None => format!("cdef extern from \"{}\":", wanted.header),
            };
            self.w.writeln(&line);
            self.w.indent();
            self.block = Some(wanted);
        }
        &mut self.w
    }

    pub fn finish(self) -> String {
        self.w.finish()
    }
}

impl Default for PxdWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Wrapper surface (`.pyx`).
#[derive(Debug)]
pub struct PyxWriter {
    w: CodeWriter,
}

impl PyxWriter {
    /// Start a wrapper module cimporting the native declarations `module`.
    pub fn new(module: &str) -> Self {
        let mut w = CodeWriter::new();
        w.writeln("# cython: language_level=3");
        w.writeln("# generated by deargen");
        w.writeln("from typing import Any, Optional, Tuple, Union");
        w.writeln("from enum import IntEnum");
        w.writeln("import ctypes");
        w.writeln("from libcpp cimport bool");
        w.writeln("from libc.stdint cimport uintptr_t");
        w.writeln(&format!("cimport {}", module));
        w.blank();
        w.blank();
        Self { w }
    }

    pub fn writer(&mut self) -> &mut CodeWriter {
        &mut self.w
    }

    pub fn finish(self) -> String {
        self.w.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indentation() {
        let mut w = CodeWriter::new();
        w.writeln("cdef class ImVec2:");
        w.indent();
        w.writeln("cdef cpp_imgui.ImVec2 *_ptr");
        w.writeln("");
        w.write_block("def __iter__(self):\n    yield self.x\n");
        w.dedent();
        w.dedent();
        w.writeln("x = 1");
        assert_eq!(
            w.finish(),
            "cdef class ImVec2:\n    cdef cpp_imgui.ImVec2 *_ptr\n\n    def __iter__(self):\n        yield self.x\nx = 1\n"
        );
    }

    #[test]
    fn test_extern_blocks_reopen_on_change() {
        let mut pxd = PxdWriter::new();
        pxd.enter("imgui.h", None).writeln("ctypedef int ImGuiID");
        pxd.enter("imgui.h", None).writeln("ctypedef int ImGuiDir");
        pxd.enter("imgui.h", Some("ImGui")).writeln("void NewFrame()");
        pxd.enter("imgui.h", None).writeln("ctypedef int ImGuiCol");
        let out = pxd.finish();

        assert_eq!(out.matches("cdef extern from \"imgui.h\":").count(), 2);
        assert_eq!(out.matches("namespace \"ImGui\"").count(), 1);
        assert!(out.contains("\n    ctypedef int ImGuiID\n    ctypedef int ImGuiDir\n"));
        assert!(out.contains("namespace \"ImGui\":\n    void NewFrame()\n"));
    }
}
