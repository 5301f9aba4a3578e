use std::fs::File;
use std::io::{self, BufWriter, Write};

// 定义一个宏来简化汇编代码的写入
macro_rules! write_asm {
    ($writer:expr, $($line:literal)*) => {
        $writer.write_all(concat!($($line, "\n"),*).as_bytes())
    };
}

#[derive(Clone, Copy)]
enum SegmentSymbol {
    Local,
    Argument,
    This,
    That,
    Temp,
    Pointer,
    Static,
    Constant,
}

impl SegmentSymbol {
    fn from_str(segment: &str) -> Option<Self> {
        match segment {
            "local" => Some(SegmentSymbol::Local),
            "argument" => Some(SegmentSymbol::Argument),
            "this" => Some(SegmentSymbol::This),
            "that" => Some(SegmentSymbol::That),
            "temp" => Some(SegmentSymbol::Temp),
            "pointer" => Some(SegmentSymbol::Pointer),
            "static" => Some(SegmentSymbol::Static),
            "constant" => Some(SegmentSymbol::Constant),
            _ => None,
        }
    }

    fn symbol(&self) -> &'static str {
        match self {
            SegmentSymbol::Local => "LCL",
            SegmentSymbol::Argument => "ARG",
            SegmentSymbol::This => "THIS",
            SegmentSymbol::That => "THAT",
            SegmentSymbol::Temp => "R5",
            SegmentSymbol::Pointer => "THIS", // Special case handled separately
            SegmentSymbol::Static => "STATIC", // Special case handled separately
            SegmentSymbol::Constant => "CONSTANT", // Special case handled separately
        }
    }
}

/// Emits Hack assembly for a stream of VM commands.
///
/// Tracks three pieces of translation-unit-wide state: a label counter for
/// comparison branches, a call counter for unique return labels, and the
/// name of the function currently being emitted into (used to scope-qualify
/// `label`/`goto`/`if-goto` targets per §4.3.5).
pub struct CodeWriter {
    output_file: BufWriter<File>,
    label_counter: usize,
    call_counter: usize,
    filename: String,
    current_function: Option<String>,
}

impl CodeWriter {
    /// 创建一个新的CodeWriter实例，用于将汇编代码写入指定的输出文件，默认启动使用Buf占据8192字节。
    pub fn new(output_filename: &str) -> Result<Self, std::io::Error> {
        let file = File::create(output_filename)?;
        let buffered = BufWriter::with_capacity(8192, file);
        Ok(CodeWriter {
            output_file: buffered,
            label_counter: 0,
            call_counter: 0,
            filename: String::new(),
            current_function: None,
        })
    }

    #[inline]
    pub fn set_filename(&mut self, filename: &str) {
        // Extract filename without path and extension
        let name = std::path::Path::new(filename)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("Unknown");
        self.filename.clear();
        self.filename.push_str(name);
    }

    /// Scope-qualifies a `label`/`goto`/`if-goto` target to `F$name` when
    /// emitted inside function `F`, per §4.3.5.
    fn qualified_label(&self, name: &str) -> String {
        match &self.current_function {
            Some(f) => format!("{f}${name}"),
            None => name.to_string(),
        }
    }

    pub fn write_arithmetic(&mut self, command: &str) -> Result<(), std::io::Error> {
        writeln!(self.output_file, "// vm command:{}", command)?;

        match command {
            "add" => self.write_binary_op("D+M"),
            "sub" => self.write_binary_op("D-M"),
            "and" => self.write_binary_op("D&M"),
            "or" => self.write_binary_op("D|M"),
            "neg" => self.write_unary_op(true),
            "not" => self.write_unary_op(false),
            "eq" => self.write_comparison("JEQ"),
            "gt" => self.write_comparison("JGT"),
            "lt" => self.write_comparison("JLT"),
            other => Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Unknown arithmetic command: {other}"),
            )),
        }
    }

    #[inline]
    fn write_binary_op(&mut self, operation: &str) -> Result<(), std::io::Error> {
        // Optimized: write all at once to reduce syscalls
        write!(
            self.output_file,
            "// get the top element of stack\n\
             @SP\n\
             M=M-1\n\
             A=M\n\
             D=M\n\
             // store the result temporarily\n\
             @R14\n\
             M=D\n\
             // get the top element of stack\n\
             @SP\n\
             M=M-1\n\
             A=M\n\
             D=M\n\
             // store the result temporarily\n\
             @R13\n\
             M=D\n\
             @R13\n\
             D=M\n\
             @R14\n\
             D={}\n",
            operation
        )?;

        self.write_push_d()?;
        self.output_file.write_all(b"\n")?;
        Ok(())
    }

    #[inline]
    fn write_unary_op(&mut self, is_neg: bool) -> Result<(), std::io::Error> {
        write_asm!(self.output_file,
            "// get the top element of stack"
            "@SP"
            "M=M-1"
            "A=M"
            "D=M"
        )?;

        if is_neg {
            write_asm!(self.output_file,
                "@0"
                "D=A-D"
            )?;
        } else {
            write_asm!(self.output_file, "D=!D")?;
        }

        self.write_push_d()?;
        self.output_file.write_all(b"\n")?;
        Ok(())
    }

    #[inline]
    fn write_comparison(&mut self, jump: &str) -> Result<(), std::io::Error> {
        let label_prefix = match jump {
            "JEQ" => "EQ",
            "JGT" => "GT",
            "JLT" => "LT",
            _ => jump,
        };
        let label_num = self.label_counter;
        self.label_counter += 1;

        write!(
            self.output_file,
            "// get the top element of stack\n\
             @SP\n\
             M=M-1\n\
             A=M\n\
             D=M\n\
             // store the result temporarily\n\
             @R14\n\
             M=D\n\
             // get the top element of stack\n\
             @SP\n\
             M=M-1\n\
             A=M\n\
             D=M\n\
             // store the result temporarily\n\
             @R13\n\
             M=D\n\
             @R13\n\
             D=M\n\
             @R14\n\
             D=D-M\n\
             @{}{}\n\
             D;{}\n\
             // push the value into stack\n\
             @SP\n\
             A=M\n\
             M=0\n\
             @SP\n\
             M=M+1\n\
             @END{}{}\n\
             0;JMP\n\
             ({}{})\n\
             // push the value into stack\n\
             @SP\n\
             A=M\n\
             M=-1\n\
             @SP\n\
             M=M+1\n\
             (END{}{})\n\n",
            label_prefix,
            label_num,
            jump,
            label_prefix,
            label_num,
            label_prefix,
            label_num,
            label_prefix,
            label_num
        )
    }

    pub fn write_push_pop(
        &mut self,
        command: &str,
        segment: &str,
        index: i32,
    ) -> Result<(), std::io::Error> {
        writeln!(
            self.output_file,
            "// vm command:{} {} {}",
            command, segment, index
        )?;

        if command == "push" {
            self.write_push(segment, index)?;
        } else if command == "pop" {
            self.write_pop(segment, index)?;
        }

        self.output_file.write_all(b"\n")?;
        Ok(())
    }

    #[inline]
    fn write_push(&mut self, segment: &str, index: i32) -> Result<(), std::io::Error> {
        match SegmentSymbol::from_str(segment) {
            Some(SegmentSymbol::Constant) => {
                write!(self.output_file, "@{}\nD=A\n", index)?;
                self.write_push_d()
            }
            Some(seg)
                if matches!(
                    seg,
                    SegmentSymbol::Local
                        | SegmentSymbol::Argument
                        | SegmentSymbol::This
                        | SegmentSymbol::That
                ) =>
            {
                let segment_symbol = seg.symbol();
                write!(
                    self.output_file,
                    "@{}\nD=M\n@{}\nA=D+A\nD=M\n",
                    segment_symbol, index
                )?;
                self.write_push_d()
            }
            Some(SegmentSymbol::Temp) => {
                Self::check_index("temp", index, 7)?;
                write!(self.output_file, "@R5\nD=A\n@{}\nA=D+A\nD=M\n", index)?;
                self.write_push_d()
            }
            Some(SegmentSymbol::Pointer) => {
                Self::check_index("pointer", index, 1)?;
                write!(self.output_file, "@THIS\nD=A\n@{}\nA=D+A\nD=M\n", index)?;
                self.write_push_d()
            }
            Some(SegmentSymbol::Static) => {
                write!(self.output_file, "@{}.{}\nD=M\n", self.filename, index)?;
                self.write_push_d()
            }
            _ => Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Unknown segment: {segment}"),
            )),
        }
    }

    /// `temp` (0..=7, backed by R5..R12) and `pointer` (0..=1, THIS/THAT)
    /// are fixed-size; any other index is a semantic error rather than a
    /// silent spill into neighbouring registers.
    #[inline]
    fn check_index(segment: &str, index: i32, max: i32) -> Result<(), std::io::Error> {
        if (0..=max).contains(&index) {
            Ok(())
        } else {
            Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("{segment} index {index} out of range (0..={max})"),
            ))
        }
    }

    #[inline]
    fn write_pop(&mut self, segment: &str, index: i32) -> Result<(), std::io::Error> {
        match SegmentSymbol::from_str(segment) {
            Some(seg)
                if matches!(
                    seg,
                    SegmentSymbol::Local
                        | SegmentSymbol::Argument
                        | SegmentSymbol::This
                        | SegmentSymbol::That
                ) =>
            {
                let segment_symbol = seg.symbol();
                write!(
                    self.output_file,
                    "@{}\n\
                     D=M\n\
                     @{}\n\
                     D=D+A\n\
                     // store the result temporarily\n\
                     @R13\n\
                     M=D\n",
                    segment_symbol, index
                )?;

                self.write_pop_to_d()?;

                write_asm!(self.output_file,
                    "// store the top value"
                    "@R13"
                    "A=M"
                    "M=D"
                )?;
                Ok(())
            }
            Some(SegmentSymbol::Temp) => {
                Self::check_index("temp", index, 7)?;
                write!(
                    self.output_file,
                    "@5\n\
                     D=A\n\
                     @{}\n\
                     D=D+A\n\
                     // store the result temporarily\n\
                     @R13\n\
                     M=D\n",
                    index
                )?;

                self.write_pop_to_d()?;

                write_asm!(self.output_file,
                    "// store the top value"
                    "@R13"
                    "A=M"
                    "M=D"
                )?;
                Ok(())
            }
            Some(SegmentSymbol::Pointer) => {
                Self::check_index("pointer", index, 1)?;
                write!(
                    self.output_file,
                    "@THIS\n\
                     D=A\n\
                     @{}\n\
                     D=D+A\n\
                     // store the result temporarily\n\
                     @R13\n\
                     M=D\n",
                    index
                )?;

                self.write_pop_to_d()?;

                write_asm!(self.output_file,
                    "// store the top value"
                    "@R13"
                    "A=M"
                    "M=D"
                )?;
                Ok(())
            }
            Some(SegmentSymbol::Static) => {
                self.write_pop_to_d()?;
                write!(self.output_file, "@{}.{}\nM=D\n", self.filename, index)
            }
            _ => Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Cannot pop to segment: {segment}"),
            )),
        }
    }

    #[inline]
    fn write_push_d(&mut self) -> Result<(), std::io::Error> {
        write_asm!(self.output_file,
            "// push the value into stack"
            "@SP"
            "A=M"
            "M=D"
            "@SP"
            "M=M+1"
        )
    }

    #[inline]
    fn write_pop_to_d(&mut self) -> Result<(), std::io::Error> {
        write_asm!(self.output_file,
            "// get the top element of stack"
            "@SP"
            "M=M-1"
            "A=M"
            "D=M"
        )
    }

    /// `label L` inside function `F` emits the scope-qualified `(F$L)`.
    pub fn write_label(&mut self, name: &str) -> Result<(), std::io::Error> {
        writeln!(self.output_file, "({})", self.qualified_label(name))
    }

    /// Unconditional jump to a scope-qualified label.
    pub fn write_goto(&mut self, name: &str) -> Result<(), std::io::Error> {
        writeln!(self.output_file, "@{}\n0;JMP", self.qualified_label(name))
    }

    /// Pops the stack top and jumps to a scope-qualified label if it is
    /// non-zero.
    pub fn write_if_goto(&mut self, name: &str) -> Result<(), std::io::Error> {
        self.write_pop_to_d()?;
        writeln!(self.output_file, "@{}\nD;JNE", self.qualified_label(name))
    }

    /// `function F n`: emits entry label `F` (unqualified) and pushes `n`
    /// zero-initialised locals. Establishes `F` as the scope for any
    /// `label`/`goto`/`if-goto` that follow, until the next `function`.
    pub fn write_function(&mut self, name: &str, n_locals: u16) -> Result<(), std::io::Error> {
        self.current_function = Some(name.to_string());
        writeln!(self.output_file, "({name})")?;
        if n_locals > 0 {
            writeln!(self.output_file, "D=0")?;
            for _ in 0..n_locals {
                self.write_push_d()?;
            }
        }
        Ok(())
    }

    /// `call F n`: pushes the return address, the caller's segment
    /// pointers, repositions ARG/LCL, jumps to `F`, then declares the
    /// return label. The return label is unique per call site within the
    /// translation unit (a monotonic counter appended to `F`).
    pub fn write_call(&mut self, name: &str, n_args: u16) -> Result<(), std::io::Error> {
        self.call_counter += 1;
        let return_label = format!("{name}$ret.{}", self.call_counter);

        writeln!(self.output_file, "@{return_label}\nD=A")?;
        self.write_push_d()?;

        for segment in ["LCL", "ARG", "THIS", "THAT"] {
            writeln!(self.output_file, "@{segment}\nD=M")?;
            self.write_push_d()?;
        }

        // ARG = SP - n_args - 5
        writeln!(
            self.output_file,
            "@{}\nD=A\n@SP\nD=M-D\n@ARG\nM=D",
            n_args as u32 + 5
        )?;
        // LCL = SP
        writeln!(self.output_file, "@SP\nD=M\n@LCL\nM=D")?;

        writeln!(self.output_file, "@{name}\n0;JMP")?;
        writeln!(self.output_file, "({return_label})")
    }

    /// `return`: unwinds the callee's frame and resumes at the saved
    /// return address. Uses R13 for `FRAME` and R14 for the return
    /// address, since both must survive the restoration of ARG/LCL.
    pub fn write_return(&mut self) -> Result<(), std::io::Error> {
        write_asm!(self.output_file,
            "// FRAME (R13) = LCL"
            "@LCL"
            "D=M"
            "@R13"
            "M=D"
            "// RET (R14) = *(FRAME-5)"
            "@5"
            "A=D-A"
            "D=M"
            "@R14"
            "M=D"
            "// *ARG = pop()"
            "@SP"
            "A=M-1"
            "D=M"
            "@ARG"
            "A=M"
            "M=D"
            "// SP = ARG+1"
            "@ARG"
            "D=M+1"
            "@SP"
            "M=D"
            "// THAT = *(FRAME-1)"
            "@R13"
            "A=M-1"
            "D=M"
            "@THAT"
            "M=D"
            "// THIS = *(FRAME-2)"
            "@2"
            "D=A"
            "@R13"
            "A=M-D"
            "D=M"
            "@THIS"
            "M=D"
            "// ARG = *(FRAME-3)"
            "@3"
            "D=A"
            "@R13"
            "A=M-D"
            "D=M"
            "@ARG"
            "M=D"
            "// LCL = *(FRAME-4)"
            "@4"
            "D=A"
            "@R13"
            "A=M-D"
            "D=M"
            "@LCL"
            "M=D"
            "// goto RET"
            "@R14"
            "A=M"
            "0;JMP"
        )
    }

    /// Synthesises `SP=256; call Sys.init 0`, the bootstrap code that
    /// precedes every multi-file VM program.
    pub fn write_init(&mut self) -> Result<(), std::io::Error> {
        writeln!(self.output_file, "// bootstrap")?;
        write_asm!(self.output_file, "@256" "D=A" "@SP" "M=D")?;
        self.write_call("Sys.init", 0)
    }

    #[inline]
    pub fn close(&mut self) -> Result<(), std::io::Error> {
        self.output_file.flush()
    }
}
