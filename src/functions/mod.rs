//! Server functions callable from pages and from the browser through the RPC bridge.

pub mod rpc;
pub mod todos;

pub use todos::{
    complete_todo, create_todo, delete_todo, list_todos, todo_titles, CompleteTodo, CreateTodo, DeleteTodo,
    ListTodos, Todo, TodoList,
};
