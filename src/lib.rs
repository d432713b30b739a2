use cfg_if::cfg_if;
use log::{error, warn};
use wgpu::SurfaceError;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, Event, KeyboardInput, VirtualKeyCode, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::window::WindowBuilder;

use crate::app::Application;

// wasm32 환경에서만 wasm_bindgen 활용
#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

pub mod app;
pub mod texture;
pub mod tracer;
pub mod util;

// wasm 연결시 아래 함수를 시작점으로 삼도록 함.
#[cfg_attr(target_arch = "wasm32", wasm_bindgen(start))]
pub async fn run() {
    // 로거 초기화
    cfg_if! {
        // 만약 현재 환경이 wasm32라면
        if #[cfg(target_arch = "wasm32")] {
            // panic 발생시 웹 브라우저의 console.err에 로그 띄우기
            std::panic::set_hook(Box::new(console_error_panic_hook::hook));
            console_log::init_with_level(log::Level::Debug).expect("로거 초기화 실패");
        } else {
            // 아니면 기본적인 로거만 불러오기
            env_logger::init();
        }
    }

    let event_loop = EventLoop::new();
    let window = match WindowBuilder::new()
        .with_title("tinytrace")
        .with_inner_size(PhysicalSize::new(1280, 720))
        .build(&event_loop)
    {
        Ok(window) => window,
        Err(error) => {
            error!("창을 만들지 못함: {error}");
            return;
        }
    };

    #[cfg(target_arch = "wasm32")]
    {
        // 웹에선 winit이 만든 canvas를 직접 문서에 붙여야 함
        use winit::platform::web::WindowExtWebSys;
        web_sys::window()
            .and_then(|win| win.document())
            .and_then(|doc| {
                let dst = doc.get_element_by_id("tinytrace")?;
                let canvas = web_sys::Element::from(window.canvas());
                dst.append_child(&canvas).ok()?;
                Some(())
            })
            .expect("canvas를 문서에 붙이지 못함");
    }

    let mut app = match Application::new(window, &event_loop).await {
        Ok(app) => app,
        Err(error) => {
            error!("초기화 실패: {error}");
            return;
        }
    };

    event_loop.run(move |event, _, control_flow| match event {
        Event::WindowEvent {
            ref event,
            window_id,
        } if window_id == app.window.id() => match event {
            // 만약 앱을 운영체제에서 닫으려고 하거나
            WindowEvent::CloseRequested => *control_flow = ControlFlow::ExitWithCode(0),
            WindowEvent::Resized(physical_size) => app.resize(*physical_size),
            WindowEvent::ScaleFactorChanged { new_inner_size, .. } => {
                app.resize(**new_inner_size)
            }
            // 나머지는 egui가 먼저 가져가고, 안 쓴 입력만 여기서 처리
            _ if app.input(event) => {}
            // 키보드 입력이 들어왔고, 그 눌러진 키가 ESC라면
            WindowEvent::KeyboardInput {
                input:
                    KeyboardInput {
                        state: ElementState::Pressed,
                        virtual_keycode: Some(VirtualKeyCode::Escape),
                        ..
                    },
                ..
            } => *control_flow = ControlFlow::ExitWithCode(0), // 나가기
            _ => {}
        },
        Event::RedrawRequested(window_id) if window_id == app.window.id() => {
            app.update();
            match app.render() {
                Ok(()) => {}
                // surface를 잃어버렸으면 다시 설정
                Err(SurfaceError::Lost | SurfaceError::Outdated) => {
                    let size = app.size;
                    app.resize(size);
                }
                Err(SurfaceError::OutOfMemory) => {
                    error!("GPU 메모리 부족");
                    *control_flow = ControlFlow::ExitWithCode(1);
                }
                Err(error) => warn!("프레임 건너뜀: {error:?}"),
            }
        }
        // 매 프레임 새로 그림
        Event::MainEventsCleared => app.window.request_redraw(),
        _ => {}
    });
}
