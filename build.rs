// Compiles the GLSL triangle shaders to the SPIR-V binaries the engine loads at startup.
// The compiled .spv files are checked in, so a missing glslc only means they are not refreshed.

use std::path::Path;
use std::process::Command;

const SHADERS: [(&str, &str); 2] = [
    ("shaders/colored_triangle.vert", "shaders/colored_triangle.vert.spv"),
    ("shaders/colored_triangle.frag", "shaders/colored_triangle.frag.spv"),
];

fn main() {
    for (input, output) in SHADERS {
        println!("cargo:rerun-if-changed={input}");
        compile_shader(input, output);
    }
}

fn compile_shader(input: &str, output: &str) {
    let result = Command::new("glslc")
        .arg(Path::new(input))
        .arg("-o")
        .arg(Path::new(output))
        .status();

    match result {
        Ok(status) if status.success() => {}
        Ok(status) => {
            panic!("failed to compile {input}: exit code {:?}", status.code());
        }
        Err(e) => {
            println!("cargo:warning=glslc not found ({e}), using the checked-in {output}");
        }
    }
}
