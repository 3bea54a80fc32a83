//! The project a fresh session starts with.

use crate::vfs::ProjectSnapshot;

const INDEX_HTML: &str = r#"<!doctype html>
<html>
  <head>
    <meta charset="UTF-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1.0" />
    <title>Playground</title>
  </head>
  <body>
    <div id="root"></div>
  </body>
</html>
"#;

const APP_JS: &str = r#"import React, { useState } from "react";
import Product from "./Product";

function App() {
  const products = [
    { id: 1, name: "Laptop", price: 60000 },
    { id: 2, name: "Headphones", price: 2000 },
    { id: 3, name: "Smartphone", price: 25000 },
  ];

  const [cart, setCart] = useState([]);

  const addToCart = (product) => {
    setCart([...cart, product]);
  };

  return (
    <div style={{ padding: "20px" }}>
      <h1>Shopping Cart</h1>

      <h2>Products</h2>
      <ul>
        {products.map((item) => (
          <Product key={item.id} product={item} addToCart={addToCart} />
        ))}
      </ul>

      <h2>Cart ({cart.length} items)</h2>
      <ul>
        {cart.map((item, index) => (
          <li key={index}>
            {item.name} - {item.price}
          </li>
        ))}
      </ul>
    </div>
  );
}

export default App;
"#;

const PRODUCT_JS: &str = r#"import React from "react";

function Product({ product, addToCart }) {
  return (
    <li style={{ margin: "10px 0" }}>
      {product.name} - {product.price}{" "}
      <button onClick={() => addToCart(product)}>Add to Cart</button>
    </li>
  );
}

export default Product;
"#;

impl ProjectSnapshot {
    pub fn starter() -> Self {
        let mut snapshot = ProjectSnapshot::from_files([
            ("index.html", INDEX_HTML),
            ("App.js", APP_JS),
            ("Product.js", PRODUCT_JS),
        ]);
        snapshot.active_path = "App.js".to_string();
        snapshot
    }
}
